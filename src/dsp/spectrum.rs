use crate::error::ScanError;

/// Averaged spectrum in ascending frequency order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedSpectrum {
    /// Bin frequencies in Hz, strictly increasing
    pub frequencies: Vec<f64>,
    /// Averaged power per bin
    pub power: Vec<f32>,
    /// Width of one bin in Hz
    pub sample_width: f64,
}

impl OrderedSpectrum {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }
}

/// A box-smoothed copy of an [`OrderedSpectrum`]'s power values.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedBand {
    pub power: Vec<f32>,
    /// Window length in bins
    pub window_samples: usize,
}

/// Swaps the lower and upper halves in place: bin `N/2` becomes bin 0.
pub fn swap_halves<T>(bins: &mut [T]) -> Result<(), ScanError> {
    let n = bins.len();
    if n % 2 != 0 {
        return Err(ScanError::OddVectorLength(n));
    }
    bins.rotate_left(n / 2);
    Ok(())
}

/// Converts an accumulated transform-order sum into a frequency-ordered average.
pub fn reorder(
    sum: &[f32],
    average_size: usize,
    center_frequency: f64,
    bandwidth: f64,
) -> Result<OrderedSpectrum, ScanError> {
    let n = sum.len();
    if average_size == 0 {
        return Err(ScanError::InvalidConfig(
            "average size must be at least 1".to_string(),
        ));
    }

    let mut power: Vec<f32> = sum.iter().map(|v| v / average_size as f32).collect();
    swap_halves(&mut power)?;

    let sample_width = bandwidth / n as f64;
    let frequencies = (0..n)
        .map(|i| center_frequency + i as f64 * sample_width - bandwidth / 2.0)
        .collect();

    Ok(OrderedSpectrum {
        frequencies,
        power,
        sample_width,
    })
}

/// Forward-scatter box filter over `window_hz`.
///
/// Each source bin far enough from the edges spreads `1/w` of its power over
/// the `w` destination bins starting `w/2` below it. Destination bins within
/// `w/2` of either edge are never written and stay exactly zero; the detector
/// relies on that to start every scan outside a signal.
pub fn smooth(ordered: &OrderedSpectrum, window_hz: f64) -> SmoothedBand {
    let n = ordered.len();
    let window_samples = if ordered.sample_width > 0.0 {
        (window_hz / ordered.sample_width).floor().max(0.0) as usize
    } else {
        0
    };
    let mut power = vec![0.0f32; n];

    if window_samples == 0 {
        return SmoothedBand {
            power,
            window_samples,
        };
    }

    let half = window_samples / 2;
    let share = 1.0 / window_samples as f32;
    let dest_end = n.saturating_sub(half);

    for i in half..n {
        // i < n - w + w/2, rearranged to stay unsigned
        if i + (window_samples - half) >= n {
            break;
        }
        let contribution = ordered.power[i] * share;
        for j in 0..window_samples {
            let dest = i + j - half;
            if dest < half || dest >= dest_end {
                continue;
            }
            power[dest] += contribution;
        }
    }

    SmoothedBand {
        power,
        window_samples,
    }
}
