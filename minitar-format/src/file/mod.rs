pub mod reader;
pub mod writer;

pub use self::reader::{ExtractStats, TarFileReader};
pub use self::writer::TarFileWriter;
