pub mod capture_device;
pub mod codec;
pub mod render_device;
