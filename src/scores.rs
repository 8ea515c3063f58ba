//! Dense row-major score matrix.

use crate::traits::AcousticScores;

/// `frames × columns` log-likelihoods stored contiguously.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreMatrix {
    columns: usize,
    data: Vec<f64>,
}

impl ScoreMatrix {
    /// Wrap `data` as a matrix with `columns` scores per frame.
    ///
    /// # Panics
    /// Panics if `columns == 0` or `data.len()` is not a multiple of `columns`.
    pub fn new(columns: usize, data: Vec<f64>) -> Self {
        assert!(columns > 0, "columns must be positive");
        assert_eq!(data.len() % columns, 0, "data is not a whole number of frames");
        Self { columns, data }
    }

    /// Matrix of `frames` rows filled with `value`.
    pub fn filled(frames: usize, columns: usize, value: f64) -> Self {
        Self::new(columns, vec![value; frames * columns])
    }

    /// Build from per-frame rows of equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let columns = rows.first().map_or(1, Vec::len).max(1);
        let mut data = Vec::with_capacity(rows.len() * columns);
        for row in rows {
            assert_eq!(row.len(), columns, "ragged score rows");
            data.extend_from_slice(row);
        }
        Self::new(columns, data)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Mutable access to one frame, for providers that fill scores in place.
    pub fn frame_mut(&mut self, t: usize) -> &mut [f64] {
        let start = t * self.columns;
        &mut self.data[start..start + self.columns]
    }
}

impl AcousticScores for ScoreMatrix {
    fn num_frames(&self) -> usize {
        self.data.len() / self.columns
    }

    fn frame(&self, t: usize) -> &[f64] {
        let start = t * self.columns;
        &self.data[start..start + self.columns]
    }
}
