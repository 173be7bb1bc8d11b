pub mod append;
pub mod create;
pub mod extract;
pub mod list;
pub mod update;

pub use append::run as append;
pub use create::run as create;
pub use extract::run as extract;
pub use list::run as list;
pub use update::run as update;
