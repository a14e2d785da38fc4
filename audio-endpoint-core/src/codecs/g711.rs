//! G.711 µ-law and A-law companding (ITU-T G.711).
//!
//! One byte per sample in both directions; the decoded values cover the
//! 16-bit range.

const ULAW_BIAS: i32 = 0x84;
const ULAW_CLIP: i32 = 32635;

/// Upper bound of each A-law segment on the 13-bit magnitude.
const ALAW_SEGMENT_END: [i32; 8] = [0x1F, 0x3F, 0x7F, 0xFF, 0x1FF, 0x3FF, 0x7FF, 0xFFF];

pub fn linear_to_ulaw(sample: i16) -> u8 {
    let mut pcm = sample as i32;
    let sign = if pcm < 0 {
        pcm = -pcm;
        0x80
    } else {
        0
    };
    pcm = pcm.min(ULAW_CLIP) + ULAW_BIAS;

    let top = ((pcm >> 7) & 0xFF) as u8;
    let exponent = 7 - top.leading_zeros() as i32;
    let mantissa = (pcm >> (exponent + 3)) & 0x0F;
    !((sign | (exponent << 4) | mantissa) as u8)
}

pub fn ulaw_to_linear(byte: u8) -> i16 {
    let u = !byte as i32;
    let exponent = (u >> 4) & 0x07;
    let magnitude = (((u & 0x0F) << 3) + ULAW_BIAS) << exponent;
    if u & 0x80 != 0 {
        (ULAW_BIAS - magnitude) as i16
    } else {
        (magnitude - ULAW_BIAS) as i16
    }
}

pub fn linear_to_alaw(sample: i16) -> u8 {
    let mut pcm = (sample as i32) >> 3;
    let mask = if pcm >= 0 {
        0xD5
    } else {
        pcm = -pcm - 1;
        0x55
    };

    let segment = ALAW_SEGMENT_END
        .iter()
        .position(|&end| pcm <= end)
        .unwrap_or(ALAW_SEGMENT_END.len()) as i32;
    if segment >= 8 {
        return (0x7F ^ mask) as u8;
    }

    let shift = if segment < 2 { 1 } else { segment };
    let value = (segment << 4) | ((pcm >> shift) & 0x0F);
    (value ^ mask) as u8
}

pub fn alaw_to_linear(byte: u8) -> i16 {
    let a = (byte ^ 0x55) as i32;
    let segment = (a & 0x70) >> 4;
    let mut magnitude = (a & 0x0F) << 4;
    match segment {
        0 => magnitude += 8,
        1 => magnitude += 0x108,
        _ => {
            magnitude += 0x108;
            magnitude <<= segment - 1;
        }
    }
    if a & 0x80 != 0 {
        magnitude as i16
    } else {
        -magnitude as i16
    }
}

pub fn encode_ulaw(pcm: &[i16]) -> Vec<u8> {
    pcm.iter().map(|&s| linear_to_ulaw(s)).collect()
}

pub fn decode_ulaw(encoded: &[u8]) -> Vec<i16> {
    encoded.iter().map(|&b| ulaw_to_linear(b)).collect()
}

pub fn encode_alaw(pcm: &[i16]) -> Vec<u8> {
    pcm.iter().map(|&s| linear_to_alaw(s)).collect()
}

pub fn decode_alaw(encoded: &[u8]) -> Vec<i16> {
    encoded.iter().map(|&b| alaw_to_linear(b)).collect()
}
