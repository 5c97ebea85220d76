//! Stages SSH material into a cloned workspace so agents can push/pull over
//! SSH remotes without the caller's own `~/.ssh` ever leaking into the
//! sandboxed clone.

use std::fs;
use std::path::Path;

use crate::error::WorkspaceError;

/// Copies every regular file out of `source_keys_dir` into `target_dir/.ssh`,
/// tightening permissions (`0600` for private keys, `0644` for `.pub` files),
/// then writes an `ssh_config` that pins GitHub/GitLab to those identities and
/// disables host-key prompting (the workspace is ephemeral and non-interactive).
/// Returns the `GIT_SSH_COMMAND` the caller should apply to the clone via
/// `git config core.sshCommand`, or `None` when nothing was staged.
pub fn stage_ssh_keys(source_keys_dir: &Path, target_dir: &Path) -> Result<Option<String>, WorkspaceError> {
    if !source_keys_dir.is_dir() {
        return Ok(None);
    }

    let ssh_dir = target_dir.join(".ssh");
    fs::create_dir_all(&ssh_dir)?;
    set_mode(&ssh_dir, 0o700)?;

    let mut private_key_names = Vec::new();
    let mut copied = 0usize;

    for entry in fs::read_dir(source_keys_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name_str = name.to_string_lossy().to_string();
        let dest = ssh_dir.join(&name);
        fs::copy(entry.path(), &dest)?;

        if name_str.ends_with(".pub") {
            set_mode(&dest, 0o644)?;
        } else {
            set_mode(&dest, 0o600)?;
            private_key_names.push(name_str);
        }
        copied += 1;
    }

    if copied == 0 {
        return Ok(None);
    }

    let config = render_ssh_config(&ssh_dir, &private_key_names);
    let config_path = ssh_dir.join("config");
    fs::write(&config_path, config)?;
    set_mode(&config_path, 0o600)?;

    Ok(git_ssh_command(&ssh_dir, &private_key_names))
}

fn render_ssh_config(ssh_dir: &Path, private_key_names: &[String]) -> String {
    let mut config = String::from(
        "Host github.com\n\
         \x20   HostName github.com\n\
         \x20   User git\n\
         \x20   IdentitiesOnly yes\n\
         \x20   StrictHostKeyChecking no\n\
         \x20   UserKnownHostsFile /dev/null\n\
         Host gitlab.com\n\
         \x20   HostName gitlab.com\n\
         \x20   User git\n\
         \x20   IdentitiesOnly yes\n\
         \x20   StrictHostKeyChecking no\n\
         \x20   UserKnownHostsFile /dev/null\n",
    );
    for key_name in private_key_names {
        config.push_str(&format!("    IdentityFile {}\n", ssh_dir.join(key_name).display()));
    }
    config
}

/// The `GIT_SSH_COMMAND` value for a clone that should use the keys staged by
/// `stage_ssh_keys`, or `None` when nothing was staged.
pub fn git_ssh_command(ssh_dir: &Path, private_key_names: &[String]) -> Option<String> {
    if private_key_names.is_empty() {
        return None;
    }
    let mut command = "ssh -o UserKnownHostsFile=/dev/null -o StrictHostKeyChecking=no".to_string();
    for key_name in private_key_names {
        command.push_str(&format!(" -i {}", ssh_dir.join(key_name).display()));
    }
    Some(command)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), WorkspaceError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), WorkspaceError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stages_private_and_public_keys_with_tightened_permissions() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("id_ed25519"), "private-material").unwrap();
        fs::write(source.path().join("id_ed25519.pub"), "public-material").unwrap();
        let target = TempDir::new().unwrap();

        let ssh_command = stage_ssh_keys(source.path(), target.path()).unwrap();
        assert!(ssh_command.unwrap().contains("-i "));

        let ssh_dir = target.path().join(".ssh");
        assert!(ssh_dir.join("id_ed25519").exists());
        assert!(ssh_dir.join("config").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let private_mode = fs::metadata(ssh_dir.join("id_ed25519")).unwrap().permissions().mode() & 0o777;
            assert_eq!(private_mode, 0o600);
            let public_mode = fs::metadata(ssh_dir.join("id_ed25519.pub")).unwrap().permissions().mode() & 0o777;
            assert_eq!(public_mode, 0o644);
        }
    }

    #[test]
    fn missing_source_directory_stages_nothing() {
        let target = TempDir::new().unwrap();
        let ssh_command = stage_ssh_keys(Path::new("/nonexistent/ssh/keys"), target.path()).unwrap();
        assert!(ssh_command.is_none());
        assert!(!target.path().join(".ssh").exists());
    }

    #[test]
    fn git_ssh_command_lists_every_private_key() {
        let ssh_dir = Path::new("/home/runner/.ssh");
        let cmd = git_ssh_command(ssh_dir, &["id_ed25519".into(), "id_rsa".into()]).unwrap();
        assert!(cmd.contains("-i /home/runner/.ssh/id_ed25519"));
        assert!(cmd.contains("-i /home/runner/.ssh/id_rsa"));
        assert!(git_ssh_command(ssh_dir, &[]).is_none());
    }
}
