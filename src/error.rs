//! # Error Types
//!
//! This module defines the error type for the fingering calculator.
//!
//! Most "nothing to show" situations are not errors: a missing root, chord or
//! instrument simply yields an empty result, and navigation pointers are
//! clamped. Errors are reserved for input that cannot be interpreted at all
//! (unknown names, malformed scale steps, unreadable YAML) and for capo masks
//! that do not fit the instrument they are applied to.
//!
//! ## Usage
//! ```rust
//! use fretcalc::{Catalog, FretError};
//!
//! let catalog = Catalog::builtin().unwrap();
//! match catalog.chord("maj13#11b9") {
//!     Ok(chord) => println!("{:?}", chord.intervals),
//!     Err(FretError::UnknownChord(name)) => eprintln!("no chord called {}", name),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FretError {
    /// A capo mask does not cover the instrument's strings.
    ///
    /// # Example
    /// ```
    /// # use fretcalc::FretError;
    /// let err = FretError::CapoMask { fret: 2, expected: 6, actual: 4 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Capo at fret 2 has a mask for 4 strings, instrument needs 6"
    /// );
    /// ```
    #[error("Capo at fret {fret} has a mask for {actual} strings, instrument needs {expected}")]
    CapoMask {
        fret: u8,
        expected: usize,
        actual: usize,
    },

    /// Catalog or preset YAML could not be read.
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    #[error("Unknown chord type: {0}")]
    UnknownChord(String),

    #[error("Unknown scale: {0}")]
    UnknownScale(String),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("Unknown progression: {0}")]
    UnknownProgression(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Unknown capo: {0}")]
    UnknownCapo(String),

    /// A scale interval string contains something other than `S`, `T` or a digit.
    ///
    /// # Example
    /// ```
    /// # use fretcalc::FretError;
    /// let err = FretError::InvalidScaleStep { step: 'Q' };
    /// assert_eq!(err.to_string(), "Invalid scale step 'Q' (expected S, T or a digit)");
    /// ```
    #[error("Invalid scale step '{step}' (expected S, T or a digit)")]
    InvalidScaleStep { step: char },

    #[error("Invalid note name: {0}")]
    InvalidNote(String),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Could not write output: {0}")]
    Output(String),
}

impl From<serde_yaml::Error> for FretError {
    fn from(err: serde_yaml::Error) -> Self {
        FretError::Catalog(err.to_string())
    }
}

impl From<serde_json::Error> for FretError {
    fn from(err: serde_json::Error) -> Self {
        FretError::Output(err.to_string())
    }
}
