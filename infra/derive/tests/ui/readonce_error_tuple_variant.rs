use readonce_derive::readonce_error;

#[readonce_error]
pub enum SealError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

fn main() {}
