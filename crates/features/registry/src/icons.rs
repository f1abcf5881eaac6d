use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use casefile_domain::package::IconAsset;
use casefile_domain::types::TypeMap;
use tracing::debug;

/// Rewrites every `icon` that names a packaged asset into a `data:` URI.
/// Returns how many definitions were rewritten; the assets can be dropped afterwards.
pub(crate) fn embed_icons(types: &mut TypeMap, assets: &[IconAsset]) -> usize {
    if assets.is_empty() {
        return 0;
    }

    let mut embedded = 0;
    for (name, definition) in types.iter_mut() {
        let Some(asset) = definition.icon().and_then(|icon| assets.iter().find(|a| a.matches(icon)))
        else {
            continue;
        };
        let uri = data_uri(asset);
        debug!(r#type = %name, icon = %asset.relative_path, "Icon embedded");
        definition.resolve_icon(uri);
        embedded += 1;
    }
    embedded
}

fn data_uri(asset: &IconAsset) -> String {
    format!("data:{};base64,{}", asset.mime_type, STANDARD.encode(&asset.bytes))
}
