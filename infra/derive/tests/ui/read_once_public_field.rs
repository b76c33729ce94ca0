use readonce_derive::read_once;

#[read_once]
pub struct Token(pub String);

fn main() {}
