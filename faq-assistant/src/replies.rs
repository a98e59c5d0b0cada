//! Fixed replies returned without (or instead of) model output.

/// Greeting/help reply for small talk and very short queries.
pub const GREETING: &str = "Halo! Ada yang bisa saya bantu? Silakan tanya tentang jam kerja, cuti, gaji, benefit, IT support, parkir, atau training.";

/// No FAQ keyword matched the query.
pub const NO_MATCH: &str = "Maaf, saya tidak menemukan informasi yang sesuai. Coba tanyakan tentang: jam kerja, cuti, gaji, benefit, IT support, parkir, atau training.";

/// The model produced nothing usable.
pub const NOT_FOUND: &str = "Maaf, informasi tidak ditemukan.";

/// Generation failed; the error itself is only logged.
pub const GENERATION_FAILED: &str = "Maaf, terjadi error.";

/// The model is still loading or failed to load.
pub const MODEL_NOT_LOADED: &str = "Model belum ter-load.";
