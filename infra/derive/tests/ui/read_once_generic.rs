use readonce_derive::read_once;

#[read_once]
pub struct Token<T>(T);

fn main() {}
