use readonce_derive::read_once;

#[read_once]
#[derive(Clone)]
pub struct Token(String);

fn main() {}
