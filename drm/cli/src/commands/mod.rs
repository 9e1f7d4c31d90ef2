pub mod playready;

pub use self::playready::PlayReadyCommand;
