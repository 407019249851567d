pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), Some(4.0));
        assert_eq!(mean(&[1.5, 2.5]), Some(2.0));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[7.0]), Some(7.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), Some(2.0));
    }

    #[test]
    fn test_std_dev_identical_values() {
        assert_eq!(std_dev(&[3.0, 3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn test_std_dev_empty_slice() {
        assert_eq!(std_dev(&[]), None);
    }
}
