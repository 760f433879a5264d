pub mod encoding;
pub mod file_name;
pub mod file_size;
pub mod fs;
pub mod id;
pub mod temp_dir;
