use std::{collections::BTreeMap, fs, path::Path};

use log::debug;

use crate::{Freqs, Result};

/// Loads a labeled corpus from `dir`.
///
/// Every sub-directory of `dir` is a label and every file inside it one sample of
/// that label. Samples are read in file name order.
///
/// # Arguments
/// * `dir` - The corpus root.
/// * `normalize` - Whether every sample's frequencies are scaled to add up to one.
pub fn load_dir<P: AsRef<Path>>(dir: P, normalize: bool) -> Result<BTreeMap<String, Vec<Freqs>>> {
    let mut corpus = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let label = entry.file_name().to_string_lossy().into_owned();
        let mut paths = Vec::new();
        for file in fs::read_dir(entry.path())? {
            let file = file?;
            if file.file_type()?.is_file() {
                paths.push(file.path());
            }
        }
        paths.sort();

        let samples = paths
            .iter()
            .map(|path| load_sample(path, normalize))
            .collect::<Result<Vec<_>>>()?;

        debug!(label = label.as_str(), samples = samples.len(); "loaded label");
        corpus.insert(label, samples);
    }

    Ok(corpus)
}

/// Tokenizes one file into a sample. Invalid UTF-8 is replaced, not rejected.
pub fn load_sample<P: AsRef<Path>>(path: P, normalize: bool) -> Result<Freqs> {
    let bytes = fs::read(path)?;
    let mut freqs = Freqs::from_text(&String::from_utf8_lossy(&bytes));
    if normalize {
        freqs.normalize();
    }

    Ok(freqs)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    /// A scratch directory under the system temp dir, removed on drop.
    struct ScratchDir(PathBuf);

    impl ScratchDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!("lexnet-{name}-{}", std::process::id()));
            let _ = fs::remove_dir_all(&path);
            fs::create_dir_all(&path).unwrap();
            Self(path)
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn loads_labels_from_sub_directories() {
        let scratch = ScratchDir::new("corpus");
        let root = &scratch.0;

        fs::create_dir(root.join("rust")).unwrap();
        fs::create_dir(root.join("python")).unwrap();
        fs::write(root.join("rust/b.rs"), "let x = 1;").unwrap();
        fs::write(root.join("rust/a.rs"), "fn main() {}").unwrap();
        fs::write(root.join("python/a.py"), "def f(): pass").unwrap();
        fs::write(root.join("README"), "ignored").unwrap();

        let corpus = load_dir(root, false).unwrap();

        assert_eq!(corpus.keys().collect::<Vec<_>>(), ["python", "rust"]);
        assert_eq!(corpus["rust"].len(), 2);
        assert_eq!(corpus["rust"][0].get("fn"), 1.);
        assert_eq!(corpus["rust"][1].get("let"), 1.);
        assert_eq!(corpus["python"][0].get("def"), 1.);
    }

    #[test]
    fn normalizes_when_asked() {
        let scratch = ScratchDir::new("sample");
        let path = scratch.0.join("s.txt");
        fs::write(&path, "a a b c").unwrap();

        assert_eq!(load_sample(&path, false).unwrap().get("a"), 2.);
        assert_eq!(load_sample(&path, true).unwrap().get("a"), 0.5);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let scratch = ScratchDir::new("missing");
        assert!(load_dir(scratch.0.join("nope"), true).is_err());
    }
}
