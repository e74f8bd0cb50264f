//! src/util/humanize.rs

/// Format a capacity given in GB, promoting to TB/PB past 1024.
pub fn human_readable_gb(size_gb: f64) -> String {
    if !size_gb.is_finite() || size_gb <= 0.0 {
        return "0 GB".to_string();
    }
    let units: [&'static str; 3] = ["GB", "TB", "PB"];
    let mut size_f = size_gb;
    let mut unit_idx: usize = 0;

    while size_f >= 1024.0 && unit_idx < units.len() - 1 {
        size_f /= 1024.0;
        unit_idx += 1;
    }

    if size_f.fract() == 0.0 {
        format!("{size_f:.0} {}", units[unit_idx])
    } else {
        format!("{size_f:.1} {}", units[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_gigabytes_have_no_decimals() {
        assert_eq!(human_readable_gb(240.0), "240 GB");
        assert_eq!(human_readable_gb(0.0), "0 GB");
    }

    #[test]
    fn promotes_to_terabytes() {
        assert_eq!(human_readable_gb(1536.0), "1.5 TB");
        assert_eq!(human_readable_gb(2048.0), "2 TB");
        assert_eq!(human_readable_gb(12.5), "12.5 GB");
    }
}
