//! System memory table parsing (`free -m` layout).

use serde::{Deserialize, Serialize};
use vitals_core::VitalsError;

/// System memory figures in megabytes.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::MemoryInfo;
///
/// let mem = MemoryInfo {
///     total_mb: 8000,
///     used_mb: 6000,
///     free_mb: 500,
///     available_mb: Some(1800),
///     swap_total_mb: 2048,
///     swap_used_mb: 0,
/// };
/// assert_eq!(mem.used_percent(), 75.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryInfo {
    /// Total physical memory.
    pub total_mb: u64,
    /// Used memory as `free` reports it.
    pub used_mb: u64,
    /// Completely free memory.
    pub free_mb: u64,
    /// Available for new workloads; absent on old `free` versions.
    pub available_mb: Option<u64>,
    /// Total swap.
    pub swap_total_mb: u64,
    /// Used swap.
    pub swap_used_mb: u64,
}

impl MemoryInfo {
    /// Used memory as a percentage of total, rounded to one decimal.
    pub fn used_percent(&self) -> f64 {
        if self.total_mb == 0 {
            return 0.0;
        }
        let pct = self.used_mb as f64 * 100.0 / self.total_mb as f64;
        (pct * 10.0).round() / 10.0
    }

    /// True when any swap is in use, an early pressure signal.
    pub fn swapping(&self) -> bool {
        self.swap_used_mb > 0
    }
}

/// Parse `free -m` output.
///
/// Looks for the `Mem:` and `Swap:` rows; column positions follow the
/// standard layout (total, used, free, shared, buff/cache, available).
/// The `available` column only exists on procps 3.3.10+; older layouts
/// put "cached" in that position, so the column is taken only when the
/// header row names it.
///
/// # Errors
///
/// Returns [`VitalsError::Parse`] when no usable `Mem:` row is present.
///
/// # Examples
///
/// ```
/// use vitals_stackscan::parse_free;
///
/// let out = "\
///               total        used        free      shared  buff/cache   available
/// Mem:           7821        3210         512         123        4098        4201
/// Swap:          2047           0        2047
/// ";
/// let mem = parse_free(out).unwrap();
/// assert_eq!(mem.total_mb, 7821);
/// assert_eq!(mem.available_mb, Some(4201));
/// ```
pub fn parse_free(output: &str) -> Result<MemoryInfo, VitalsError> {
    let mut mem: Option<(u64, u64, u64, Option<u64>)> = None;
    let mut swap: (u64, u64) = (0, 0);
    let mut header_has_available = false;

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.first() {
            Some(&"Mem:") if fields.len() >= 4 => {
                let total = parse_field(fields[1])?;
                let used = parse_field(fields[2])?;
                let free = parse_field(fields[3])?;
                let available = if header_has_available {
                    fields.get(6).and_then(|f| f.parse().ok())
                } else {
                    None
                };
                mem = Some((total, used, free, available));
            }
            Some(&"Swap:") if fields.len() >= 3 => {
                swap = (
                    fields[1].parse().unwrap_or(0),
                    fields[2].parse().unwrap_or(0),
                );
            }
            _ => {
                if fields.contains(&"available") {
                    header_has_available = true;
                }
            }
        }
    }

    let (total_mb, used_mb, free_mb, available_mb) =
        mem.ok_or_else(|| VitalsError::Parse("no Mem: row in free output".into()))?;

    Ok(MemoryInfo {
        total_mb,
        used_mb,
        free_mb,
        available_mb,
        swap_total_mb: swap.0,
        swap_used_mb: swap.1,
    })
}

fn parse_field(field: &str) -> Result<u64, VitalsError> {
    field
        .parse()
        .map_err(|_| VitalsError::Parse(format!("bad memory figure: {field}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modern_free_output() {
        let out = "\
              total        used        free      shared  buff/cache   available
Mem:           7821        3210         512         123        4098        4201
Swap:          2047         100        1947
";
        let mem = parse_free(out).unwrap();
        assert_eq!(mem.total_mb, 7821);
        assert_eq!(mem.used_mb, 3210);
        assert_eq!(mem.free_mb, 512);
        assert_eq!(mem.available_mb, Some(4201));
        assert_eq!(mem.swap_total_mb, 2047);
        assert!(mem.swapping());
    }

    #[test]
    fn old_layout_without_available_column() {
        let out = "\
             total       used       free     shared    buffers     cached
Mem:          3953       3855         97          0        232       1892
Swap:         4095          0       4095
";
        let mem = parse_free(out).unwrap();
        assert_eq!(mem.total_mb, 3953);
        // Column 6 is "cached" on this layout; the header has no
        // "available" column, so none may be reported.
        assert_eq!(mem.available_mb, None);
        assert!(!mem.swapping());
    }

    #[test]
    fn used_percent_rounds_to_one_decimal() {
        let mem = MemoryInfo {
            total_mb: 7821,
            used_mb: 3210,
            free_mb: 512,
            available_mb: None,
            swap_total_mb: 0,
            swap_used_mb: 0,
        };
        assert_eq!(mem.used_percent(), 41.0);
    }

    #[test]
    fn missing_mem_row_is_parse_error() {
        let err = parse_free("garbage\n").unwrap_err();
        assert!(matches!(err, VitalsError::Parse(_)));
    }
}
