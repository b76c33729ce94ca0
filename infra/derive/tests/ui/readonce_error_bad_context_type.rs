use readonce_derive::readonce_error;

#[readonce_error]
pub enum SealError {
    #[error("Consumed")]
    Consumed { context: Option<String> },
}

fn main() {}
