pub mod capture;
pub mod endpoint;
pub mod format_manager;
pub mod playback;
pub mod signal;
pub mod signals;

#[cfg(test)]
mod test_support;
