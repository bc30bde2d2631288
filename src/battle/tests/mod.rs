pub mod common;






#[cfg(test)]
mod test_catch;

#[cfg(test)]
mod test_flee;
