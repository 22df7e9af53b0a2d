use crate::model::Banner;
use serde_json::Value;

/// Flattens an upstream image listing into one banner per resolution
///
/// Entries without a URL are skipped. The listing order is kept, and within
/// an entry the `original` resolution comes before the others.
pub fn banners_from_images(raw: &Value) -> Vec<Banner> {
    let Some(images) = raw.as_array() else {
        return Vec::new();
    };

    let mut banners = Vec::new();
    for image in images {
        let Some(resolutions) = image.get("resolutions").and_then(Value::as_object) else {
            continue;
        };
        let id = image.get("id").and_then(Value::as_u64);
        let kind = image
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let main = image.get("main").and_then(Value::as_bool).unwrap_or(false);

        let mut ordered: Vec<(&String, &Value)> = resolutions.iter().collect();
        ordered.sort_by_key(|(name, _)| name.as_str() != "original");

        for (name, resolution) in ordered {
            let Some(url) = resolution.get("url").and_then(Value::as_str) else {
                continue;
            };
            let width = resolution.get("width").and_then(Value::as_u64);
            let height = resolution.get("height").and_then(Value::as_u64);
            let resolution = match (width, height) {
                (Some(width), Some(height)) => format!("{}x{}", width, height),
                _ => name.clone(),
            };
            banners.push(Banner {
                id,
                kind: kind.clone(),
                resolution,
                url: url.trim().to_string(),
                main,
            });
        }
    }
    banners
}

/// Builds the poster banner derived from a show's original image
pub fn poster_banner(image_original: &str) -> Banner {
    Banner {
        id: None,
        kind: "poster".to_string(),
        resolution: "original".to_string(),
        url: image_original.trim().to_string(),
        main: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_banners_from_images() {
        let banners = banners_from_images(&json!([
            {
                "id": 1,
                "type": "poster",
                "main": true,
                "resolutions": {
                    "medium": {"url": "p-m.jpg", "width": 210, "height": 295},
                    "original": {"url": "p-o.jpg", "width": 680, "height": 1000}
                }
            },
            {
                "id": 2,
                "type": "background",
                "main": false,
                "resolutions": {"original": {"url": "bg.jpg"}}
            },
            {"id": 3, "type": "banner"}
        ]));

        assert_eq!(banners.len(), 3);
        assert_eq!(banners[0].url, "p-o.jpg");
        assert_eq!(banners[0].resolution, "680x1000");
        assert!(banners[0].main);
        assert_eq!(banners[1].resolution, "210x295");
        assert_eq!(banners[2].kind, "background");
        assert_eq!(banners[2].resolution, "original");
        assert!(!banners[2].main);
    }

    #[test]
    fn test_non_list_yields_nothing() {
        assert!(banners_from_images(&json!({"error": "nope"})).is_empty());
    }

    #[test]
    fn test_poster_banner() {
        let banner = poster_banner("http://static.tvmaze.com/o.jpg");
        assert_eq!(banner.kind, "poster");
        assert_eq!(banner.url, "http://static.tvmaze.com/o.jpg");
    }
}
