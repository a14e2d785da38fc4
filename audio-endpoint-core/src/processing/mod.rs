pub mod pcm;
pub mod sample_buffer;
