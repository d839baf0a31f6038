pub mod traits;
pub mod solana;
pub mod discord;
