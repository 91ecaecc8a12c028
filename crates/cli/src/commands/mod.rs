pub mod check;
pub mod sign;
pub mod verify;
