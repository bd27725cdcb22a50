pub mod balance;
pub mod demo;
pub mod faucet;
pub mod init;
pub mod resolve;
