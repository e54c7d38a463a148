//! Semantic Similarity over a Taxonomy
//!
//! Structure-derived measures of "how related are these two concepts",
//! computed purely from the shape of the taxonomy.
//!
//! # Information Content
//!
//! Intrinsic IC metrics need no external corpus:
//!
//! 1. **intrinsic_ic**: descendant density (Resnik 1999, Seco 2004)
//! 2. **intrinsic_ic_sanchez**: leaves relative to ancestors (Sánchez 2011)
//! 3. **intrinsic_ic_zhou**: descendant density blended with level (Zhou 2008)
//! 4. **weighted_ic**: descendant weight mass, for injected frequencies
//!
//! # Similarity Scores
//!
//! For a pair of terms and an IC metric:
//! - **resnik**: IC of the most informative common ancestor (MICA)
//! - **lin**: MICA IC relative to the mean IC of the pair
//! - **jiang** / **jiang_seco**: transforms of the Jiang–Conrath distance
//! - **batet** / **batet_log**: ancestor-set overlap, independent of IC

pub mod information_content;
pub mod similarity;
