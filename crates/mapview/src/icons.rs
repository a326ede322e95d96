use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::engine::{IconLoader, MapHandle};

/// Point-of-interest label → icon file stem, matching the names the app's
/// map data uses.
pub const PIN_ICONS: &[(&str, &str)] = &[
    ("Airport", "airport"),
    ("Rampart", "EmergencyClinic"),
    ("Center Camp Plaza", "centerCamp"),
    ("center", "center"),
    ("Burner Express Bus Depot", "bus"),
    ("Station 3", "firstAid"),
    ("Station 9", "firstAid"),
    ("Playa Info", "info"),
    ("Ranger Station Berlin", "ranger"),
    ("Ranger Station Tokyo", "ranger"),
    ("Ranger HQ", "ranger"),
    ("Ice Nine Arctica", "ice"),
    ("Arctica Center Camp", "ice"),
    ("Ice Cubed Arctica 3", "ice"),
    ("The Temple", "temple"),
    ("toilet", "toilet"),
    ("Artery", "artery"),
    ("Yellow Bike Project", "bike"),
    ("Hell Station", "fuel"),
    ("Census Checkpoint", "census"),
    ("BLM LE Substation", "police"),
    ("Gate Actual", "gate"),
    ("Box Office", "boxOffice"),
    ("Greeters", "greeters"),
    ("The Man", "center"),
    ("Temple", "temple"),
    ("Center Camp", "centerCamp"),
    ("First Aid", "firstAid"),
    ("Medical", "EmergencyClinic"),
    ("Emergency Clinic", "EmergencyClinic"),
    ("Ice", "ice"),
    ("Rangers", "ranger"),
    ("Recycle", "recycle"),
    ("Burner Express", "bus"),
];

/// Decoded RGBA icon pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub data: Rc<[u8]>,
}

impl IconImage {
    pub fn new(width: u32, height: u32, data: impl Into<Rc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconError {
    Fetch(String),
    Decode(String),
    /// Source image reported a zero dimension.
    Empty,
}

impl std::fmt::Display for IconError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IconError::Fetch(msg) => write!(f, "icon fetch failed: {msg}"),
            IconError::Decode(msg) => write!(f, "icon decode failed: {msg}"),
            IconError::Empty => write!(f, "icon has no pixels"),
        }
    }
}

impl std::error::Error for IconError {}

pub fn icon_url(base_path: &str, file: &str) -> String {
    format!("{}/{file}.png", base_path.trim_end_matches('/'))
}

/// Size that fits `width`×`height` into a `target`-pixel longest edge.
pub fn scaled_size(width: u32, height: u32, target: u32) -> Result<(u32, u32), IconError> {
    let longest = width.max(height);
    if width == 0 || height == 0 {
        return Err(IconError::Empty);
    }
    let scale = target as f64 / longest as f64;
    let w = (width as f64 * scale).round().max(1.0) as u32;
    let h = (height as f64 * scale).round().max(1.0) as u32;
    Ok((w, h))
}

/// Icons loaded during one initialization pass, keyed by icon file.
///
/// Failures are remembered too, so a missing file is requested once.
#[derive(Debug, Default)]
pub struct IconCache {
    entries: RefCell<BTreeMap<String, Result<IconImage, IconError>>>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file: &str) -> Option<Result<IconImage, IconError>> {
        self.entries.borrow().get(file).cloned()
    }

    pub fn insert(&self, file: &str, result: Result<IconImage, IconError>) {
        self.entries.borrow_mut().insert(file.to_string(), result);
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct IconPassSummary {
    pub registered: usize,
    pub skipped: usize,
    pub failed: usize,
}

struct IconPass {
    map: Rc<dyn MapHandle>,
    loader: Rc<dyn IconLoader>,
    entries: Vec<(String, String)>,
    base_path: String,
    target_size: u32,
    cache: IconCache,
    summary: RefCell<IconPassSummary>,
    done: RefCell<Option<Box<dyn FnOnce(IconPassSummary)>>>,
}

/// Register every `(name, file)` entry as a named map image.
///
/// Entries are processed one at a time so that a file shared by several
/// names is fetched once and served from the pass cache afterwards. A name
/// the map already knows is left untouched. `done` runs after the last entry.
pub fn register_icons(
    map: Rc<dyn MapHandle>,
    loader: Rc<dyn IconLoader>,
    entries: &[(&str, &str)],
    base_path: &str,
    target_size: u32,
    done: impl FnOnce(IconPassSummary) + 'static,
) {
    let pass = Rc::new(IconPass {
        map,
        loader,
        entries: entries
            .iter()
            .map(|(n, f)| (n.to_string(), f.to_string()))
            .collect(),
        base_path: base_path.to_string(),
        target_size,
        cache: IconCache::new(),
        summary: RefCell::new(IconPassSummary::default()),
        done: RefCell::new(Some(Box::new(done))),
    });
    step(pass, 0);
}

fn step(pass: Rc<IconPass>, index: usize) {
    let Some((name, file)) = pass.entries.get(index).cloned() else {
        let summary = *pass.summary.borrow();
        tracing::debug!(
            registered = summary.registered,
            skipped = summary.skipped,
            failed = summary.failed,
            "pin icon pass finished"
        );
        let done = pass.done.borrow_mut().take();
        if let Some(done) = done {
            done(summary);
        }
        return;
    };

    if let Some(cached) = pass.cache.get(&file) {
        apply(&pass, &name, &file, cached);
        step(pass, index + 1);
        return;
    }

    let url = icon_url(&pass.base_path, &file);
    let next = pass.clone();
    pass.loader.load(
        &url,
        pass.target_size,
        Box::new(move |result| {
            next.cache.insert(&file, result.clone());
            apply(&next, &name, &file, result);
            step(next, index + 1);
        }),
    );
}

fn apply(pass: &IconPass, name: &str, file: &str, result: Result<IconImage, IconError>) {
    let mut summary = pass.summary.borrow_mut();
    match result {
        Ok(image) => {
            if pass.map.has_image(name) {
                summary.skipped += 1;
                return;
            }
            match pass.map.add_image(name, &image) {
                Ok(()) => summary.registered += 1,
                Err(err) => {
                    tracing::warn!(name, file, "failed to register pin image: {err}");
                    summary.failed += 1;
                }
            }
        }
        Err(err) => {
            tracing::warn!(name, file, "failed to load pin image: {err}");
            summary.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MapError, MarkerSpec};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    #[derive(Default)]
    struct ImageMap {
        images: RefCell<Vec<String>>,
    }

    impl MapHandle for ImageMap {
        fn add_navigation_control(&self, _position: &str) -> Result<(), MapError> {
            Ok(())
        }
        fn on_load(&self, _callback: Box<dyn FnOnce()>) {}
        fn on_error(&self, _callback: Box<dyn FnMut(MapError)>) {}
        fn add_marker(&self, _marker: &MarkerSpec) -> Result<(), MapError> {
            Ok(())
        }
        fn add_source(&self, _id: &str, _source: &Value) -> Result<(), MapError> {
            Ok(())
        }
        fn add_layer(&self, _layer: &Value) -> Result<(), MapError> {
            Ok(())
        }
        fn has_image(&self, name: &str) -> bool {
            self.images.borrow().iter().any(|n| n == name)
        }
        fn add_image(&self, name: &str, _image: &IconImage) -> Result<(), MapError> {
            self.images.borrow_mut().push(name.to_string());
            Ok(())
        }
        fn remove(&self) {}
    }

    #[derive(Default)]
    struct CountingLoader {
        requests: RefCell<Vec<String>>,
        missing: Vec<&'static str>,
    }

    impl IconLoader for CountingLoader {
        fn load(
            &self,
            url: &str,
            target_size: u32,
            done: Box<dyn FnOnce(Result<IconImage, IconError>)>,
        ) {
            self.requests.borrow_mut().push(url.to_string());
            if self.missing.iter().any(|m| url.contains(m)) {
                done(Err(IconError::Fetch("404".to_string())));
            } else {
                let px = (target_size * target_size * 4) as usize;
                done(Ok(IconImage::new(target_size, target_size, vec![0u8; px])));
            }
        }
    }

    #[test]
    fn shared_icon_file_is_fetched_once() {
        let map = Rc::new(ImageMap::default());
        let loader = Rc::new(CountingLoader::default());
        let result = Rc::new(RefCell::new(None));
        let r = result.clone();

        register_icons(
            map.clone(),
            loader.clone(),
            &[("Ranger Station Berlin", "ranger"), ("Ranger HQ", "ranger")],
            "/assets/images/pins",
            40,
            move |s| *r.borrow_mut() = Some(s),
        );

        assert_eq!(
            *loader.requests.borrow(),
            vec!["/assets/images/pins/ranger.png".to_string()]
        );
        assert_eq!(
            *map.images.borrow(),
            vec!["Ranger Station Berlin".to_string(), "Ranger HQ".to_string()]
        );
        assert_eq!(
            *result.borrow(),
            Some(IconPassSummary {
                registered: 2,
                skipped: 0,
                failed: 0
            })
        );
    }

    #[test]
    fn full_table_fetches_each_file_once() {
        let map = Rc::new(ImageMap::default());
        let loader = Rc::new(CountingLoader::default());
        register_icons(map.clone(), loader.clone(), PIN_ICONS, "/assets/images/pins/", 40, |_| {});

        let mut files: Vec<&str> = PIN_ICONS.iter().map(|(_, f)| *f).collect();
        files.sort();
        files.dedup();
        assert_eq!(loader.requests.borrow().len(), files.len());
        assert_eq!(map.images.borrow().len(), PIN_ICONS.len());
    }

    #[test]
    fn existing_names_are_skipped() {
        let map = Rc::new(ImageMap::default());
        map.images.borrow_mut().push("Temple".to_string());
        let loader = Rc::new(CountingLoader::default());
        let result = Rc::new(RefCell::new(None));
        let r = result.clone();
        register_icons(
            map.clone(),
            loader,
            &[("Temple", "temple"), ("The Temple", "temple")],
            "/p",
            40,
            move |s| *r.borrow_mut() = Some(s),
        );
        assert_eq!(result.borrow().map(|s| s.skipped), Some(1));
        assert_eq!(map.images.borrow().len(), 2);
    }

    #[test]
    fn failed_file_is_not_refetched_and_others_continue() {
        let map = Rc::new(ImageMap::default());
        let loader = Rc::new(CountingLoader {
            missing: vec!["ice"],
            ..Default::default()
        });
        let result = Rc::new(RefCell::new(None));
        let r = result.clone();
        register_icons(
            map.clone(),
            loader.clone(),
            &[("Ice", "ice"), ("Ice Nine Arctica", "ice"), ("Airport", "airport")],
            "/p",
            40,
            move |s| *r.borrow_mut() = Some(s),
        );
        assert_eq!(loader.requests.borrow().len(), 2);
        assert_eq!(*map.images.borrow(), vec!["Airport".to_string()]);
        assert_eq!(result.borrow().map(|s| s.failed), Some(2));
    }

    #[test]
    fn scaled_size_fits_longest_edge() {
        assert_eq!(scaled_size(80, 40, 40), Ok((40, 20)));
        assert_eq!(scaled_size(25, 50, 40), Ok((20, 40)));
        assert_eq!(scaled_size(33, 100, 40), Ok((13, 40)));
        assert_eq!(scaled_size(0, 10, 40), Err(IconError::Empty));
    }

    #[test]
    fn icon_url_tolerates_trailing_slash() {
        assert_eq!(icon_url("/assets/images/pins/", "bus"), "/assets/images/pins/bus.png");
    }
}
