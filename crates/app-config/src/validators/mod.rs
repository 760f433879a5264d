pub mod directory;
pub mod file;
pub mod url;
