pub mod game_state;
pub mod genre;
pub mod llm_decode;
pub mod narrative;
pub mod transcript;
