// Asset externalization - inline data URIs out to <workspace>/assets/
// Pages reference assets by root-relative path: assets/<file>

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

use crate::directory::Directory;
use crate::error::{FolioError, Result};
use crate::models::{Block, BlockContent};

pub const ASSETS_DIR: &str = "assets";

/// Decoded `data:<mime>;base64,<payload>` URI
#[derive(Debug)]
struct DataUri {
    mime: String,
    bytes: Vec<u8>,
}

pub fn isDataUri(src: &str) -> bool {
    src.starts_with("data:")
}

fn parseDataUri(src: &str) -> Result<DataUri> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| FolioError::validation("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| FolioError::validation("data URI has no payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| FolioError::validation("only base64 data URIs can be externalized"))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| FolioError::validation(format!("invalid base64 payload: {}", e)))?;
    Ok(DataUri {
        mime: if mime.is_empty() { "application/octet-stream".to_string() } else { mime.to_lowercase() },
        bytes,
    })
}

fn extensionFor(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/bmp" => "bmp",
        "image/avif" => "avif",
        _ => "bin",
    }
}

fn mimeFor(fileName: &str) -> &'static str {
    let ext = fileName.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Asset filename derived from the payload, so identical bytes always map to the same file.
/// The stem comes from the caption when it has one.
fn assetFileName(caption: &str, ext: &str, bytes: &[u8]) -> String {
    let mut stem = slug::slugify(caption);
    stem.truncate(40);
    let stem = stem.trim_end_matches('-');
    let stem = if stem.is_empty() { "image" } else { stem };
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, bytes).simple().to_string();
    format!("{}-{}.{}", stem, &digest[..12], ext)
}

/// Write bytes into assets/ (once per distinct payload) and return the path pages should reference
pub fn storeAsset(root: &dyn Directory, caption: &str, ext: &str, bytes: &[u8]) -> Result<String> {
    let assets = root.getDirectory(ASSETS_DIR, true)?;
    let name = assetFileName(caption, ext, bytes);
    if assets.hasFile(&name) {
        tracing::debug!("[storeAsset] {} already stored", name);
    } else {
        assets.writeFile(&name, bytes)?;
        tracing::debug!("[storeAsset] Wrote {} ({} bytes)", name, bytes.len());
    }
    Ok(format!("{}/{}", ASSETS_DIR, name))
}

/// Move every inline image payload into assets/, rewriting `src` in place.
/// Data URIs that cannot be decoded are left inline. Returns the number moved.
pub fn externalizeAssets(root: &dyn Directory, blocks: &mut [Block]) -> Result<usize> {
    let mut moved = 0;
    for block in blocks.iter_mut() {
        let BlockContent::Image { src, caption } = &mut block.content else {
            continue;
        };
        if !isDataUri(src) {
            continue;
        }
        let uri = match parseDataUri(src) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!("[externalizeAssets] Keeping block {} inline: {}", block.id, e);
                continue;
            }
        };
        *src = storeAsset(root, caption, extensionFor(&uri.mime), &uri.bytes)?;
        moved += 1;
    }
    Ok(moved)
}

/// Asset file name from an `assets/<file>` reference
fn assetName(src: &str) -> Result<&str> {
    let name = src
        .strip_prefix("./")
        .unwrap_or(src)
        .strip_prefix(ASSETS_DIR)
        .and_then(|s| s.strip_prefix('/'))
        .ok_or_else(|| FolioError::validation(format!("{} is not an asset path", src)))?;
    if name.is_empty() || name.contains('/') || name == ".." {
        return Err(FolioError::validation(format!("{} is not an asset path", src)));
    }
    Ok(name)
}

pub fn readAsset(root: &dyn Directory, src: &str) -> Result<Vec<u8>> {
    let name = assetName(src)?;
    let assets = root.getDirectory(ASSETS_DIR, false)?;
    assets.readFile(name)
}

/// Inline form of an asset for display
pub fn assetDataUri(root: &dyn Directory, src: &str) -> Result<String> {
    let bytes = readAsset(root, src)?;
    let mime = mimeFor(assetName(src)?);
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::LocalDirectory;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_parse_data_uri() {
        let uri = parseDataUri(PNG_URI).unwrap();
        assert_eq!(uri.mime, "image/png");
        assert_eq!(uri.bytes, vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        assert!(parseDataUri("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_externalize_rewrites_src() {
        let tmp = tempfile::tempdir().unwrap();
        let root = LocalDirectory::open(tmp.path()).unwrap();
        let mut blocks = vec![
            Block::new(1, BlockContent::Image { src: PNG_URI.to_string(), caption: "My Photo".to_string() }),
            Block::new(2, BlockContent::Image { src: "https://example.com/x.png".to_string(), caption: String::new() }),
        ];

        assert_eq!(externalizeAssets(&root, &mut blocks).unwrap(), 1);

        let BlockContent::Image { src, .. } = &blocks[0].content else { panic!("not an image") };
        assert!(src.starts_with("assets/my-photo-"));
        assert!(src.ends_with(".png"));
        assert_eq!(readAsset(&root, src).unwrap().len(), 8);
        assert_eq!(assetDataUri(&root, src).unwrap(), PNG_URI);

        let BlockContent::Image { src, .. } = &blocks[1].content else { panic!("not an image") };
        assert_eq!(src, "https://example.com/x.png");
    }

    #[test]
    fn test_same_payload_is_stored_once() {
        let tmp = tempfile::tempdir().unwrap();
        let root = LocalDirectory::open(tmp.path()).unwrap();
        let image = || Block::new(1, BlockContent::Image { src: PNG_URI.to_string(), caption: "Logo".to_string() });

        let mut first = vec![image()];
        let mut second = vec![image()];
        externalizeAssets(&root, &mut first).unwrap();
        externalizeAssets(&root, &mut second).unwrap();

        assert_eq!(first[0].content, second[0].content);
        assert_eq!(std::fs::read_dir(tmp.path().join(ASSETS_DIR)).unwrap().count(), 1);

        let other = storeAsset(&root, "Logo", "png", b"different bytes").unwrap();
        let BlockContent::Image { src, .. } = &first[0].content else { panic!("not an image") };
        assert_ne!(&other, src);
    }

    #[test]
    fn test_asset_paths_cannot_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let root = LocalDirectory::open(tmp.path()).unwrap();
        assert!(matches!(readAsset(&root, "assets/../secret"), Err(FolioError::Validation(_))));
        assert!(matches!(readAsset(&root, "elsewhere/x.png"), Err(FolioError::Validation(_))));
    }
}
