use crate::{Extent, Result};

const PARAM_EXTENT: &str = "mapext";
const PARAM_SIZE: &str = "mapsize";

/// Base URL of a map service, with any extent or size parameters removed.
///
/// The widget appends its own `mapsize` and `mapext` parameters for every
/// request, so both are stripped from the URL given by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapUrl {
    url: String,
    stripped: String,
}

impl MapUrl {
    /// Parse a map URL and extract the extent given by its `mapext`
    /// parameter, if there is one.
    ///
    /// An unparsable `mapext` value is reported as an error rather than
    /// silently ignored.
    pub fn parse(url: &str) -> Result<(MapUrl, Option<Extent>)> {
        // the fragment never reaches the server
        let base = url.split_once('#').map_or(url, |(base, _)| base);

        let (head, query) = match base.split_once('?') {
            Some((head, query)) => (head, Some(query)),
            None => (base, None),
        };

        let mut extent = None;
        let mut stripped = head.to_owned();

        if let Some(query) = query {
            let mut kept = Vec::new();

            for param in query.split('&') {
                let (key, value) = param.split_once('=').unwrap_or((param, ""));

                if key.eq_ignore_ascii_case(PARAM_EXTENT) {
                    extent = Some(decode_numbers(value).parse()?);
                } else if !key.eq_ignore_ascii_case(PARAM_SIZE) {
                    kept.push(param);
                }
            }

            stripped.push('?');
            stripped.push_str(&kept.join("&"));
        }

        let map_url = MapUrl {
            url: url.to_owned(),
            stripped,
        };

        Ok((map_url, extent))
    }

    /// The URL as originally given.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The URL without extent and size parameters.
    pub fn stripped(&self) -> &str {
        &self.stripped
    }

    /// Build the request URL for an image of the given pixel size covering
    /// the given extent.
    pub fn map_url(&self, width: u32, height: u32, extent: &Extent) -> String {
        let mut url = self.stripped.clone();

        if !url.contains('?') {
            url.push('?');
        } else if !url.ends_with('?') && !url.ends_with('&') {
            url.push('&');
        }

        url.push_str(&format!(
            "{PARAM_SIZE}={width} {height}&{PARAM_EXTENT}={extent}"
        ));
        url
    }
}

fn decode_numbers(value: &str) -> String {
    value.replace("%20", " ").replace('+', " ")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    #[test]
    fn extract_extent() {
        let (url, ext) = MapUrl::parse("http://host/map?mapext=1 2 3 4&layers=x").unwrap();

        assert_eq!(ext, Some(Extent::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(url.stripped(), "http://host/map?layers=x");
        assert_eq!(url.as_str(), "http://host/map?mapext=1 2 3 4&layers=x");
    }

    #[test]
    fn extract_extent_last_param() {
        let (url, ext) =
            MapUrl::parse("http://host/cgi-bin/mapserv?map=a.map&mode=map&MAPEXT=-1.5+2+3.5+4")
                .unwrap();

        assert_eq!(ext, Some(Extent::new(-1.5, 2.0, 3.5, 4.0)));
        assert_eq!(url.stripped(), "http://host/cgi-bin/mapserv?map=a.map&mode=map");
    }

    #[test]
    fn extract_extent_encoded_spaces() {
        let (_, ext) = MapUrl::parse("http://host/map?mapext=1%202%203%204").unwrap();
        assert_eq!(ext, Some(Extent::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn drop_fragment() {
        let (url, ext) = MapUrl::parse("http://host/map?layers=x&mapext=1 2 3 4#top").unwrap();

        assert_eq!(ext, Some(Extent::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(url.stripped(), "http://host/map?layers=x");

        let (url, _) = MapUrl::parse("http://host/map#top").unwrap();
        assert_eq!(
            url.map_url(2, 1, &Extent::new(0.0, 0.0, 2.0, 1.0)),
            "http://host/map?mapsize=2 1&mapext=0 0 2 1"
        );
    }

    #[test]
    fn strip_size() {
        let (url, ext) = MapUrl::parse("http://host/map?mapsize=10 10&layers=x").unwrap();

        assert_eq!(ext, None);
        assert_eq!(url.stripped(), "http://host/map?layers=x");
    }

    #[test]
    fn no_extent() {
        let (url, ext) = MapUrl::parse("http://host/map?mode=map&layers=catasto").unwrap();

        assert_eq!(ext, None);
        assert_eq!(url.stripped(), "http://host/map?mode=map&layers=catasto");
    }

    #[test]
    fn mapext_prefix_is_not_matched() {
        let (url, ext) = MapUrl::parse("http://host/map?mapextra=1&layers=x").unwrap();

        assert_eq!(ext, None);
        assert_eq!(url.stripped(), "http://host/map?mapextra=1&layers=x");
    }

    #[test]
    fn invalid_extent() {
        let res = MapUrl::parse("http://host/map?mapext=1 2 3&layers=x");
        assert!(matches!(res, Err(Error::InvalidExtent(_))));
    }

    #[test]
    fn build_map_url() {
        let (url, _) = MapUrl::parse("http://host/map?mode=map&layers=x").unwrap();
        let ext = Extent::new(1.5, 2.0, 3.0, 4.25);

        assert_eq!(
            url.map_url(640, 480, &ext),
            "http://host/map?mode=map&layers=x&mapsize=640 480&mapext=1.5 2 3 4.25"
        );
    }

    #[test]
    fn build_map_url_without_query() {
        let ext = Extent::new(0.0, 0.0, 1.0, 1.0);

        let (url, _) = MapUrl::parse("http://host/map").unwrap();
        assert_eq!(
            url.map_url(2, 3, &ext),
            "http://host/map?mapsize=2 3&mapext=0 0 1 1"
        );

        let (url, _) = MapUrl::parse("http://host/map?mapext=0 0 1 1").unwrap();
        assert_eq!(
            url.map_url(2, 3, &ext),
            "http://host/map?mapsize=2 3&mapext=0 0 1 1"
        );
    }
}
