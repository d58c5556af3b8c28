// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Record SMT output and save to a file for debugging purposes.

use std::{
    collections::hash_map::DefaultHasher,
    fs,
    hash::{Hash, Hasher},
    io,
    path::{Path, PathBuf},
};

use crate::sexp::Sexp;

/// Transcript of the commands sent to one solver process.
#[derive(Debug)]
pub struct Tee {
    dir: PathBuf,
    contents: Vec<Sexp>,
}

fn short_hash<T: Hash>(v: T) -> String {
    let mut hash_state = DefaultHasher::new();
    v.hash(&mut hash_state);
    format!("{:016x}", hash_state.finish())[..8].to_string()
}

/// Turn a check's descriptive name into something usable as a file name.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl Tee {
    /// Create a new empty transcript whose files go in `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            contents: vec![],
        }
    }

    /// Append a raw s-expression sent to solver.
    pub fn append(&mut self, s: Sexp) {
        self.contents.push(s)
    }

    fn render(&self) -> String {
        self.contents
            .iter()
            .map(|s| match s {
                Sexp::Comment(c) if c.is_empty() => String::new(),
                Sexp::Comment(c) => format!(";; {c}"),
                s => s.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Save the transcript so far as `<name>-<hash>.smt2`, where the hash is
    /// of the contents, so distinct queries with the same name don't clobber
    /// each other. Returns the saved path.
    pub fn save(&self, name: &str) -> io::Result<PathBuf> {
        let contents = self.render();
        let stem = file_stem(name);
        let hash = short_hash(&contents);
        let fname = if stem.is_empty() {
            format!("query-{hash}.smt2")
        } else {
            format!("{stem}-{hash}.smt2")
        };
        fs::create_dir_all(&self.dir)?;
        let dest = self.dir.join(fname);
        fs::write(&dest, contents)?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::{file_stem, Tee};
    use crate::sexp::{app, atom_s, Sexp};

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Impl$$foo.bar"), "Impl__foo_bar");
        assert_eq!(file_stem("check-1"), "check-1");
    }

    #[test]
    fn test_render() {
        let mut tee = Tee::new("unused");
        tee.append(Sexp::Comment("z3 -in -smt2".to_string()));
        tee.append(app("push", [atom_s("1")]));
        tee.append(Sexp::Comment(String::new()));
        tee.append(app("check-sat", []));
        insta::assert_snapshot!(tee.render(), @r"
        ;; z3 -in -smt2
        (push 1)

        (check-sat)
        ");
    }

    #[test]
    fn test_save() {
        let dir = std::env::temp_dir().join(format!("smtlib-tee-{}", std::process::id()));
        let mut tee = Tee::new(&dir);
        tee.append(app("check-sat", []));
        let path = tee.save("goal one").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("goal_one-"), "unexpected name {name}");
        assert!(name.ends_with(".smt2"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "(check-sat)");
        std::fs::remove_dir_all(dir).unwrap();
    }
}
