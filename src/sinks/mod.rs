#[cfg(test)]
pub mod collecting;
pub mod log;
