//! Output path conventions.

use std::path::{Path, PathBuf};

/// `<dir>/<stem><suffix>.<ext>`, with `dir` defaulting to the input's directory
/// and the extension defaulting to `csv`.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tabclean_output::derive_output_path;
///
/// let out = derive_output_path(Path::new("data/co2.csv"), "_preprocess", None);
/// assert_eq!(out, PathBuf::from("data/co2_preprocess.csv"));
/// ```
pub fn derive_output_path(input: &Path, suffix: &str, dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map_or_else(|| "csv".to_string(), |ext| ext.to_string_lossy().into_owned());
    let parent = dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    parent.join(format!("{stem}{suffix}.{ext}"))
}

/// Replace a `from` marker in the file stem with `to` (`_Cleaned` to
/// `_Preprocessed`), appending `to` when the marker is absent.
pub fn replace_stem_marker(input: &Path, from: &str, to: &str, dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    if from.is_empty() || !stem.contains(from) {
        return derive_output_path(input, to, dir);
    }
    let renamed = stem.replace(from, to);
    let with_ext = match input.extension() {
        Some(ext) => format!("{renamed}.{}", ext.to_string_lossy()),
        None => format!("{renamed}.csv"),
    };
    dir.map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join(with_ext)
}

/// File-name-safe form of a value: lower case, spaces to underscores,
/// punctuation dropped.
///
/// ```
/// use tabclean_output::slugify;
///
/// assert_eq!(slugify("Carbon stocks in forests (Million tonnes)"), "carbon_stocks_in_forests_million_tonnes");
/// ```
pub fn slugify(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_suffix_paths() {
        assert_eq!(
            derive_output_path(Path::new("co2/CO2 Emission.csv"), "_preprocess", None),
            PathBuf::from("co2/CO2 Emission_preprocess.csv")
        );
        assert_eq!(
            derive_output_path(Path::new("in/air.csv"), "_long", Some(Path::new("out"))),
            PathBuf::from("out/air_long.csv")
        );
        assert_eq!(
            derive_output_path(Path::new("energy"), "_clean", None),
            PathBuf::from("energy_clean.csv")
        );
    }

    #[test]
    fn replaces_cleaned_marker() {
        assert_eq!(
            replace_stem_marker(
                Path::new("climate/GlobalTemperatures_Cleaned.csv"),
                "_Cleaned",
                "_Preprocessed",
                Some(Path::new("preprocessed"))
            ),
            PathBuf::from("preprocessed/GlobalTemperatures_Preprocessed.csv")
        );
        assert_eq!(
            replace_stem_marker(Path::new("t.csv"), "_Cleaned", "_Preprocessed", None),
            PathBuf::from("t_Preprocessed.csv")
        );
    }

    #[test]
    fn slugify_drops_punctuation() {
        assert_eq!(slugify("Forest area, 1000 HA"), "forest_area_1000_ha");
    }
}
