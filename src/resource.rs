//! The path-keyed resource tree and its CoRE Link Format (RFC 6690)
//! discovery rendering.
//!
//! Grounded on the original Python reference's `CoapResource`/`CoapServer`
//! classes: a resource optionally carries GET/PUT callables and a list of
//! children, and the server keeps a flat, path-keyed lookup table that
//! `addResource`/`getResource`/`getResourcesInCoRELinkFormat` operate on.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

use crate::handler::Handler;

/// The CoRE Link Format attributes a resource can advertise.
#[derive(Debug, Default, Clone)]
pub struct ResourceAttributes {
    pub title: Option<String>,
    pub resource_type: Option<String>,
    pub interface: Option<String>,
    pub content_type: Option<u16>,
}

/// A resource as constructed by the embedder, before it's registered. Owns
/// its children only until [`Registry::add`] flattens them into the
/// registry's own path-keyed map.
pub struct Resource {
    pub path: String,
    pub attributes: ResourceAttributes,
    pub get: Option<Handler>,
    pub put: Option<Handler>,
    pub children: Vec<Resource>,
}

impl Resource {
    pub fn new(path: impl Into<String>) -> Resource {
        Resource {
            path: path.into(),
            attributes: ResourceAttributes::default(),
            get: None,
            put: None,
            children: Vec::new(),
        }
    }

    pub fn with_get(mut self, handler: Handler) -> Resource {
        self.get = Some(handler);
        self
    }

    pub fn with_put(mut self, handler: Handler) -> Resource {
        self.put = Some(handler);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Resource {
        self.attributes.title = Some(title.into());
        self
    }

    pub fn with_resource_type(mut self, rt: impl Into<String>) -> Resource {
        self.attributes.resource_type = Some(rt.into());
        self
    }

    pub fn with_interface(mut self, if_: impl Into<String>) -> Resource {
        self.attributes.interface = Some(if_.into());
        self
    }

    pub fn with_content_type(mut self, ct: u16) -> Resource {
        self.attributes.content_type = Some(ct);
        self
    }

    pub fn with_child(mut self, child: Resource) -> Resource {
        self.children.push(child);
        self
    }
}

/// A registered resource's handlers and metadata, keyed by its full path in
/// the registry.
pub(crate) struct RegisteredResource {
    pub attributes: ResourceAttributes,
    pub get: Option<Handler>,
    pub put: Option<Handler>,
}

/// The flat, path-keyed resource table. A `BTreeMap` so both lookup and
/// ascending-path discovery rendering fall out of the storage choice, the
/// same way the teacher's option codec gets sorted-by-number iteration for
/// free from its own `BTreeMap<u16, _>`.
#[derive(Default)]
pub struct Registry {
    resources: BTreeMap<String, RegisteredResource>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            resources: BTreeMap::new(),
        }
    }

    /// Registers `resource` and, recursively, its children under
    /// `resource.path` as a prefix (`parent_path/child_path`).
    pub fn add(&mut self, resource: Resource) {
        self.add_under(None, resource);
    }

    fn add_under(&mut self, parent: Option<&str>, resource: Resource) {
        let full_path = match parent {
            Some(p) => alloc::format!("{}/{}", p, resource.path),
            None => resource.path.clone(),
        };
        let Resource {
            attributes,
            get,
            put,
            children,
            ..
        } = resource;
        self.resources.insert(
            full_path.clone(),
            RegisteredResource { attributes, get, put },
        );
        for child in children {
            self.add_under(Some(&full_path), child);
        }
    }

    /// Removes the resource at `path` and every resource nested under it.
    pub fn remove(&mut self, path: &str) {
        let prefix = alloc::format!("{}/", path);
        self.resources
            .retain(|p, _| p != path && !p.starts_with(&prefix));
    }

    pub(crate) fn get(&self, path: &str) -> Option<&RegisteredResource> {
        self.resources.get(path)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resources.contains_key(path)
    }

    /// Renders every registered resource as a CoRE Link Format (RFC 6690)
    /// document, in ascending path order.
    pub fn render_core_link_format(&self) -> String {
        self.resources
            .iter()
            .map(|(path, resource)| render_one(path, resource))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn render_one(path: &str, resource: &RegisteredResource) -> String {
    let mut out = alloc::format!("<{}>", path);
    let mut attrs = Vec::new();
    if let Some(rt) = &resource.attributes.resource_type {
        attrs.push(alloc::format!(r#"rt="{}""#, rt));
    }
    if let Some(if_) = &resource.attributes.interface {
        attrs.push(alloc::format!(r#"if="{}""#, if_));
    }
    if let Some(title) = &resource.attributes.title {
        attrs.push(alloc::format!(r#"title="{}""#, title));
    }
    if let Some(ct) = resource.attributes.content_type {
        attrs.push(alloc::format!("ct={}", ct));
    }
    if !attrs.is_empty() {
        out.push(';');
        out.push_str(&attrs.join(";"));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_empty_registry() {
        let registry = Registry::new();
        assert_eq!("", registry.render_core_link_format());
    }

    #[test]
    fn renders_one_resource_with_attributes() {
        let mut registry = Registry::new();
        registry.add(Resource::new("temp").with_resource_type("temperature"));
        assert_eq!(
            r#"<temp>;rt="temperature""#,
            registry.render_core_link_format()
        );
    }

    #[test]
    fn renders_in_ascending_path_order() {
        let mut registry = Registry::new();
        registry.add(Resource::new("zeta"));
        registry.add(Resource::new("alpha"));
        assert_eq!("<alpha>,<zeta>", registry.render_core_link_format());
    }

    #[test]
    fn child_path_is_composed_with_parent() {
        let mut registry = Registry::new();
        registry.add(Resource::new("sensors").with_child(Resource::new("temp")));
        assert!(registry.exists("sensors/temp"));
        assert!(registry.exists("sensors"));
    }

    #[test]
    fn remove_drops_descendants() {
        let mut registry = Registry::new();
        registry.add(Resource::new("sensors").with_child(Resource::new("temp")));
        registry.remove("sensors");
        assert!(!registry.exists("sensors"));
        assert!(!registry.exists("sensors/temp"));
    }
}
