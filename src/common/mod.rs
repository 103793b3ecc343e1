pub mod response;
pub mod tmp_file;
pub mod upload;
