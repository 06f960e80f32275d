/// Audio data encoded as base64, little-endian PCM16 once decoded.
pub type Base64EncodedAudioBytes = String;
