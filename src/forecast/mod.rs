pub mod normalize;
pub mod openweather;
pub mod types;

#[cfg(test)]
pub mod mock;
