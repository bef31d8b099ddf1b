//! Archive fetch — download a published archive and unpack it in place.
//!
//! Mirrors the pipeline's one-time data setup: if the destination is already
//! populated the whole step is skipped, otherwise the archive is downloaded,
//! optionally checksum-verified, and extracted. Nothing is extracted from an
//! archive that fails verification.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

/// Supported archive container formats, detected from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

/// What the fetch step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Destination already populated; nothing downloaded.
    AlreadyPresent,
    Extracted,
}

/// Detect the archive kind from the URL path (query string ignored).
pub fn detect_kind(url: &str) -> Option<ArchiveKind> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if path.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else {
        None
    }
}

/// Download `url` and extract it into `dest`. A non-empty `dest` short-circuits
/// the whole step. When `sha256` is given the download is verified before
/// extraction.
pub fn fetch_archive(url: &str, dest: &Path, sha256: Option<&str>) -> Result<FetchOutcome, String> {
    // The skip comes first: a populated destination needs no URL at all.
    if dir_is_populated(dest) {
        return Ok(FetchOutcome::AlreadyPresent);
    }

    let kind = detect_kind(url)
        .ok_or_else(|| format!("cannot tell archive type from URL (need .zip/.tar.gz): {}", url))?;

    std::fs::create_dir_all(dest)
        .map_err(|e| format!("cannot create {}: {}", dest.display(), e))?;

    let staged = dest.join(".titoctl.download");
    let result = download_verify_extract(url, kind, &staged, dest, sha256);
    // The staged archive is transient either way.
    let _ = std::fs::remove_file(&staged);
    result?;

    Ok(FetchOutcome::Extracted)
}

fn download_verify_extract(
    url: &str,
    kind: ArchiveKind,
    staged: &Path,
    dest: &Path,
    sha256: Option<&str>,
) -> Result<(), String> {
    download(url, staged)?;
    if let Some(expected) = sha256 {
        check_sha256(staged, expected)?;
    }
    match kind {
        ArchiveKind::Zip => extract_zip(staged, dest),
        ArchiveKind::TarGz => extract_tar_gz(staged, dest),
    }
}

/// True when the directory exists and holds anything at all.
fn dir_is_populated(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn download(url: &str, target: &Path) -> Result<(), String> {
    let mut resp = reqwest::blocking::get(url)
        .map_err(|e| format!("download failed: {}", e))?
        .error_for_status()
        .map_err(|e| format!("download failed: {}", e))?;

    let mut file = File::create(target)
        .map_err(|e| format!("cannot create {}: {}", target.display(), e))?;
    std::io::copy(&mut resp, &mut file)
        .map_err(|e| format!("cannot write {}: {}", target.display(), e))?;
    Ok(())
}

/// Verify a file against a hex-encoded SHA-256 digest.
fn check_sha256(path: &Path, expected: &str) -> Result<(), String> {
    let actual = sha256_of_file(path)?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(format!(
            "checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        ))
    }
}

fn sha256_of_file(path: &Path) -> Result<String, String> {
    let mut file =
        File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), String> {
    let file =
        File::open(archive).map_err(|e| format!("cannot open {}: {}", archive.display(), e))?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| format!("bad zip archive: {}", e))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| format!("bad zip entry: {}", e))?;
        // enclosed_name refuses entries that would escape dest
        let rel = entry
            .enclosed_name()
            .ok_or_else(|| format!("archive entry escapes destination: {}", entry.name()))?;
        let out_path = dest.join(rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| format!("cannot create {}: {}", out_path.display(), e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| format!("cannot create {}: {}", out_path.display(), e))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| format!("cannot write {}: {}", out_path.display(), e))?;

        // Keep the executable bit of shipped binaries
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| format!("cannot chmod {}: {}", out_path.display(), e))?;
        }
    }
    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), String> {
    let file =
        File::open(archive).map_err(|e| format!("cannot open {}: {}", archive.display(), e))?;
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
    // unpack() rejects entries that would land outside dest
    tar.unpack(dest)
        .map_err(|e| format!("cannot extract into {}: {}", dest.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind("https://x.org/data.zip"), Some(ArchiveKind::Zip));
        assert_eq!(
            detect_kind("https://x.org/data.tar.gz?download=1"),
            Some(ArchiveKind::TarGz)
        );
        assert_eq!(detect_kind("https://x.org/data.tgz"), Some(ArchiveKind::TarGz));
        assert_eq!(detect_kind("https://x.org/data.rar"), None);
        assert_eq!(detect_kind("https://x.org/data"), None);
    }

    #[test]
    fn test_populated_destination_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "present").unwrap();

        // Bogus URL: must never be contacted when the destination is populated
        let outcome = fetch_archive("https://invalid.invalid/data.zip", dir.path(), None).unwrap();
        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
    }

    #[test]
    fn test_populated_destination_wins_over_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "present").unwrap();

        // Even an unrecognizable URL is irrelevant once the data is in place
        let outcome = fetch_archive("https://invalid.invalid/data.rar", dir.path(), None).unwrap();
        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
    }

    #[test]
    fn test_sha256_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("abc.txt");
        std::fs::write(&f, "abc").unwrap();
        assert_eq!(
            sha256_of_file(&f).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(check_sha256(
            &f,
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        )
        .is_ok());
        assert!(check_sha256(&f, "deadbeef").is_err());
    }

    fn build_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_zip_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("data.zip");
        build_zip(
            &archive,
            &[("basic/maskgrid.tif", "grid"), ("templates/control.txt", "tpl")],
        );

        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        extract_zip(&archive, &dest).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("basic/maskgrid.tif")).unwrap(),
            "grid"
        );
        assert_eq!(
            std::fs::read_to_string(dest.join("templates/control.txt")).unwrap(),
            "tpl"
        );
    }

    #[test]
    fn test_extract_zip_rejects_escaping_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        build_zip(&archive, &[("../evil.txt", "nope")]);

        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        let err = extract_zip(&archive, &dest).unwrap_err();
        assert!(err.contains("escapes destination"));
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn test_extract_tar_gz_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("data.tar.gz");

        let gz = flate2::write::GzEncoder::new(
            File::create(&archive).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(gz);
        let data = b"precipitation";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "precip/GFS/sample.tif", data.as_slice())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        extract_tar_gz(&archive, &dest).unwrap();
        assert_eq!(
            std::fs::read(dest.join("precip/GFS/sample.tif")).unwrap(),
            data
        );
    }
}
