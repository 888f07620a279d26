/// Name used when the archive's file name yields nothing usable.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// Derive the project name from the archive's file name.
///
/// `My Project.zip` becomes `My Project`; the rest of the name is kept
/// verbatim, whitespace included. Names without a `.zip` extension, or with
/// nothing in front of it, get [`DEFAULT_PROJECT_NAME`].
pub fn project_name(archive_file_name: &str) -> String {
    let stem = archive_file_name
        .len()
        .checked_sub(".zip".len())
        .filter(|&split| archive_file_name.is_char_boundary(split))
        .map(|split| archive_file_name.split_at(split))
        .filter(|(_, extension)| extension.eq_ignore_ascii_case(".zip"))
        .map(|(stem, _)| stem);

    match stem {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => DEFAULT_PROJECT_NAME.to_string(),
    }
}
