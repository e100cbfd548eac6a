pub mod board_io;
pub mod lock;
pub mod session_io;
