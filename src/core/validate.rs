use std::path::Path;

use thiserror::Error;

const MAX_NAME_LEN: usize = 100;
const MIN_TOKEN_LEN: usize = 20;
const CLASSIC_PREFIX: &str = "ghp_";
const CLASSIC_MIN_LEN: usize = 40;
const FINE_GRAINED_PREFIX: &str = "github_pat_";
const FINE_GRAINED_MIN_LEN: usize = 50;
const FINE_GRAINED_MIN_TAIL: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Folder path cannot be empty")]
    FolderEmpty,
    #[error("Folder does not exist: {0}")]
    FolderMissing(String),
    #[error("Path is not a directory: {0}")]
    NotADirectory(String),
    #[error("Folder is not readable: {0}")]
    FolderUnreadable(String),
    #[error("Folder already contains a git repository: {0}")]
    AlreadyARepository(String),

    #[error("Repository name cannot be empty")]
    NameEmpty,
    #[error("Repository name must be {MAX_NAME_LEN} characters or less")]
    NameTooLong,
    #[error("Repository name can only contain alphanumeric characters, hyphens, underscores, and periods")]
    NameBadCharacter,
    #[error("Repository name cannot start or end with a period")]
    NameEdgePeriod,
    #[error("Repository name cannot contain consecutive periods")]
    NameDoublePeriod,

    #[error("Token cannot be empty")]
    TokenEmpty,
    #[error("Token appears too short (GitHub tokens are typically 40+ characters)")]
    TokenTooShort,
    #[error("Classic token appears too short")]
    ClassicTokenTooShort,
    #[error("Invalid classic token format")]
    ClassicTokenBadFormat,
    #[error("Fine-grained token appears too short")]
    FineGrainedTokenTooShort,
    #[error("Invalid fine-grained token format")]
    FineGrainedTokenBadFormat,
    #[error("Token must start with 'ghp_' (classic) or 'github_pat_' (fine-grained)")]
    TokenUnknownPrefix,
}

/// Check that `path` names an existing, readable directory that is not
/// already under version control.
pub fn check_folder(path: &Path) -> Result<(), InputError> {
    if path.as_os_str().is_empty() {
        return Err(InputError::FolderEmpty);
    }

    let display = path.display().to_string();
    if !path.exists() {
        return Err(InputError::FolderMissing(display));
    }
    if !path.is_dir() {
        return Err(InputError::NotADirectory(display));
    }
    if std::fs::read_dir(path).is_err() {
        return Err(InputError::FolderUnreadable(display));
    }
    if path.join(".git").is_dir() {
        return Err(InputError::AlreadyARepository(display));
    }
    Ok(())
}

/// Check the GitHub repository name rules: 1-100 characters from
/// `[A-Za-z0-9._-]`, no leading or trailing period, no `..`.
pub fn check_repo_name(name: &str) -> Result<(), InputError> {
    if name.is_empty() {
        return Err(InputError::NameEmpty);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(InputError::NameTooLong);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(InputError::NameBadCharacter);
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(InputError::NameEdgePeriod);
    }
    if name.contains("..") {
        return Err(InputError::NameDoublePeriod);
    }
    Ok(())
}

/// Check the shape of a GitHub personal access token without using it.
///
/// Classic tokens are `ghp_` plus at least 36 alphanumerics; fine-grained
/// tokens are `github_pat_` plus at least 40 characters of `[A-Za-z0-9_]`.
/// The token value itself is never logged or echoed.
pub fn check_token(token: &str) -> Result<(), InputError> {
    if token.is_empty() {
        return Err(InputError::TokenEmpty);
    }
    if token.len() < MIN_TOKEN_LEN {
        return Err(InputError::TokenTooShort);
    }

    if let Some(tail) = token.strip_prefix(CLASSIC_PREFIX) {
        if token.len() < CLASSIC_MIN_LEN {
            return Err(InputError::ClassicTokenTooShort);
        }
        if !tail.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InputError::ClassicTokenBadFormat);
        }
        Ok(())
    } else if let Some(tail) = token.strip_prefix(FINE_GRAINED_PREFIX) {
        if token.len() < FINE_GRAINED_MIN_LEN {
            return Err(InputError::FineGrainedTokenTooShort);
        }
        if tail.len() < FINE_GRAINED_MIN_TAIL
            || !tail.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(InputError::FineGrainedTokenBadFormat);
        }
        Ok(())
    } else {
        Err(InputError::TokenUnknownPrefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic_token(tail_len: usize) -> String {
        let tail: String = "A1b2".repeat(tail_len / 4 + 1).chars().take(tail_len).collect();
        format!("ghp_{tail}")
    }

    #[test]
    fn test_folder_must_exist_and_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_folder(dir.path()).is_ok());

        let missing = dir.path().join("nope");
        assert_eq!(
            check_folder(&missing),
            Err(InputError::FolderMissing(missing.display().to_string()))
        );

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(
            check_folder(&file),
            Err(InputError::NotADirectory(file.display().to_string()))
        );
    }

    #[test]
    fn test_folder_with_git_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        assert!(matches!(
            check_folder(dir.path()),
            Err(InputError::AlreadyARepository(_))
        ));
    }

    #[test]
    fn test_empty_folder_path() {
        assert_eq!(check_folder(Path::new("")), Err(InputError::FolderEmpty));
    }

    #[test]
    fn test_valid_repo_names() {
        for name in ["my-repo_1.0", "a", "Repo", "x.y.z", "under_score", "123"] {
            assert!(check_repo_name(name).is_ok(), "expected '{}' to pass", name);
        }
        assert!(check_repo_name(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn test_invalid_repo_names() {
        assert_eq!(check_repo_name(""), Err(InputError::NameEmpty));
        assert_eq!(check_repo_name(&"a".repeat(101)), Err(InputError::NameTooLong));
        assert_eq!(check_repo_name("bad name!"), Err(InputError::NameBadCharacter));
        assert_eq!(check_repo_name("has space"), Err(InputError::NameBadCharacter));
        assert_eq!(check_repo_name(".hidden"), Err(InputError::NameEdgePeriod));
        assert_eq!(check_repo_name("trailing."), Err(InputError::NameEdgePeriod));
        assert_eq!(check_repo_name("double..dot"), Err(InputError::NameDoublePeriod));
    }

    #[test]
    fn test_valid_classic_token() {
        // ghp_ plus 41 alphanumerics, 45 characters total
        let token = classic_token(41);
        assert_eq!(token.len(), 45);
        assert!(check_token(&token).is_ok());
    }

    #[test]
    fn test_valid_fine_grained_token() {
        let token = format!("github_pat_{}", "a1_B".repeat(11));
        assert!(token.len() >= 50);
        assert!(check_token(&token).is_ok());
    }

    #[test]
    fn test_invalid_tokens() {
        assert_eq!(check_token(""), Err(InputError::TokenEmpty));
        assert_eq!(check_token("short"), Err(InputError::TokenTooShort));
        assert_eq!(check_token(&classic_token(10)), Err(InputError::TokenTooShort));
        assert_eq!(
            check_token(&format!("ghp_{}", "a".repeat(32))),
            Err(InputError::ClassicTokenTooShort)
        );
        assert_eq!(
            check_token(&format!("ghp_{}!", "a".repeat(40))),
            Err(InputError::ClassicTokenBadFormat)
        );
        assert_eq!(
            check_token(&format!("github_pat_{}", "a".repeat(20))),
            Err(InputError::FineGrainedTokenTooShort)
        );
        assert_eq!(
            check_token(&format!("github_pat_{}-", "a".repeat(40))),
            Err(InputError::FineGrainedTokenBadFormat)
        );
        assert_eq!(
            check_token(&format!("gho_{}", "a".repeat(40))),
            Err(InputError::TokenUnknownPrefix)
        );
    }
}
