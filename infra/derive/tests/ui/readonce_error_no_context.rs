use readonce_derive::readonce_error;

#[readonce_error]
pub enum SealError {
    #[error("IO error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

fn main() {}
