pub mod intake;
pub mod loc;
pub mod shell;
pub mod task;
