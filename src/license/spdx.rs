use std::collections::HashMap;

use crate::models::{License, LICENSE_UNKNOWN_KEY};

/// Licenses keyed the way the GitHub API reports them: `(key, SPDX id, name)`.
///
/// An empty SPDX id marks umbrella entries that have no SPDX page.
#[rustfmt::skip]
const KNOWN_LICENSES: &[(&str, &str, &str)] = &[
    // Permissive
    ("0bsd", "0BSD", "BSD Zero Clause License"),
    ("mit", "MIT", "MIT License"),
    ("mit-0", "MIT-0", "MIT No Attribution"),
    ("bsd-1-clause", "BSD-1-Clause", "BSD 1-Clause License"),
    ("bsd-2-clause", "BSD-2-Clause", "BSD 2-Clause \"Simplified\" License"),
    ("bsd-2-clause-patent", "BSD-2-Clause-Patent", "BSD 2-Clause Plus Patent License"),
    ("bsd-3-clause", "BSD-3-Clause", "BSD 3-Clause \"New\" or \"Revised\" License"),
    ("bsd-3-clause-clear", "BSD-3-Clause-Clear", "BSD 3-Clause Clear License"),
    ("bsd-4-clause", "BSD-4-Clause", "BSD 4-Clause \"Original\" or \"Old\" License"),
    ("isc", "ISC", "ISC License"),
    ("ncsa", "NCSA", "University of Illinois/NCSA Open Source License"),
    ("apache-1.1", "Apache-1.1", "Apache License 1.1"),
    ("apache-2.0", "Apache-2.0", "Apache License 2.0"),
    ("afl-3.0", "AFL-3.0", "Academic Free License v3.0"),
    ("ecl-2.0", "ECL-2.0", "Educational Community License v2.0"),
    ("bsl-1.0", "BSL-1.0", "Boost Software License 1.0"),
    ("unlicense", "Unlicense", "The Unlicense"),
    ("zlib", "Zlib", "zlib License"),
    ("postgresql", "PostgreSQL", "PostgreSQL License"),
    ("wtfpl", "WTFPL", "Do What The F*ck You Want To Public License"),
    ("artistic-2.0", "Artistic-2.0", "Artistic License 2.0"),
    ("python-2.0", "Python-2.0", "Python License 2.0"),
    ("upl-1.0", "UPL-1.0", "Universal Permissive License v1.0"),
    ("blueoak-1.0.0", "BlueOak-1.0.0", "Blue Oak Model License 1.0.0"),
    // Strong copyleft
    ("gpl", "", "GNU General Public License Family"),
    ("gpl-2.0", "GPL-2.0-only", "GNU General Public License v2.0"),
    ("gpl-2.0-only", "GPL-2.0-only", "GNU General Public License v2.0 only"),
    ("gpl-2.0-or-later", "GPL-2.0-or-later", "GNU General Public License v2.0 or later"),
    ("gpl-3.0", "GPL-3.0-only", "GNU General Public License v3.0"),
    ("gpl-3.0-only", "GPL-3.0-only", "GNU General Public License v3.0 only"),
    ("gpl-3.0-or-later", "GPL-3.0-or-later", "GNU General Public License v3.0 or later"),
    ("agpl-3.0", "AGPL-3.0-only", "GNU Affero General Public License v3.0"),
    ("agpl-3.0-only", "AGPL-3.0-only", "GNU Affero General Public License v3.0 only"),
    ("agpl-3.0-or-later", "AGPL-3.0-or-later", "GNU Affero General Public License v3.0 or later"),
    ("eupl-1.1", "EUPL-1.1", "European Union Public License 1.1"),
    ("eupl-1.2", "EUPL-1.2", "European Union Public License 1.2"),
    ("osl-3.0", "OSL-3.0", "Open Software License 3.0"),
    // Weak copyleft
    ("lgpl", "", "GNU Lesser General Public License Family"),
    ("lgpl-2.1", "LGPL-2.1-only", "GNU Lesser General Public License v2.1"),
    ("lgpl-2.1-only", "LGPL-2.1-only", "GNU Lesser General Public License v2.1 only"),
    ("lgpl-2.1-or-later", "LGPL-2.1-or-later", "GNU Lesser General Public License v2.1 or later"),
    ("lgpl-3.0", "LGPL-3.0-only", "GNU Lesser General Public License v3.0"),
    ("lgpl-3.0-only", "LGPL-3.0-only", "GNU Lesser General Public License v3.0 only"),
    ("lgpl-3.0-or-later", "LGPL-3.0-or-later", "GNU Lesser General Public License v3.0 or later"),
    ("mpl-1.1", "MPL-1.1", "Mozilla Public License 1.1"),
    ("mpl-2.0", "MPL-2.0", "Mozilla Public License 2.0"),
    ("epl-1.0", "EPL-1.0", "Eclipse Public License 1.0"),
    ("epl-2.0", "EPL-2.0", "Eclipse Public License 2.0"),
    ("cddl-1.0", "CDDL-1.0", "Common Development and Distribution License 1.0"),
    ("cddl-1.1", "CDDL-1.1", "Common Development and Distribution License 1.1"),
    ("cpl-1.0", "CPL-1.0", "Common Public License 1.0"),
    ("ms-pl", "MS-PL", "Microsoft Public License"),
    ("ms-rl", "MS-RL", "Microsoft Reciprocal License"),
    ("lppl-1.3c", "LPPL-1.3c", "LaTeX Project Public License v1.3c"),
    // Creative Commons
    ("cc", "", "Creative Commons License Family"),
    ("cc0-1.0", "CC0-1.0", "Creative Commons Zero v1.0 Universal"),
    ("cc-by-3.0", "CC-BY-3.0", "Creative Commons Attribution 3.0 Unported"),
    ("cc-by-4.0", "CC-BY-4.0", "Creative Commons Attribution 4.0 International"),
    ("cc-by-sa-3.0", "CC-BY-SA-3.0", "Creative Commons Attribution ShareAlike 3.0 Unported"),
    ("cc-by-sa-4.0", "CC-BY-SA-4.0", "Creative Commons Attribution ShareAlike 4.0 International"),
    ("cc-by-nc-4.0", "CC-BY-NC-4.0", "Creative Commons Attribution Non Commercial 4.0 International"),
    ("cc-by-nc-sa-4.0", "CC-BY-NC-SA-4.0", "Creative Commons Attribution Non Commercial ShareAlike 4.0 International"),
    ("cc-by-nd-4.0", "CC-BY-ND-4.0", "Creative Commons Attribution No Derivatives 4.0 International"),
    // Fonts
    ("ofl-1.1", "OFL-1.1", "SIL Open Font License 1.1"),
    // Catch-alls GitHub may report
    ("other", "", "Other"),
    ("proprietary", "", "Proprietary"),
];

/// Immutable lookup table of known licenses.
///
/// Always contains the `na` sentinel; lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct LicenseTable {
    licenses: HashMap<String, License>,
}

impl LicenseTable {
    pub fn new(licenses: impl IntoIterator<Item = License>) -> Self {
        let mut map: HashMap<String, License> = licenses
            .into_iter()
            .map(|l| (normalize_key(&l.key), l))
            .collect();
        map.insert(LICENSE_UNKNOWN_KEY.to_string(), License::unknown());
        Self { licenses: map }
    }

    pub fn get(&self, key: &str) -> Option<&License> {
        self.licenses.get(&normalize_key(key))
    }

    pub fn unknown(&self) -> License {
        self.licenses
            .get(LICENSE_UNKNOWN_KEY)
            .cloned()
            .unwrap_or_else(License::unknown)
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }
}

impl Default for LicenseTable {
    /// Licenses the GitHub API commonly reports, plus the `na` sentinel.
    fn default() -> Self {
        Self::new(KNOWN_LICENSES.iter().map(|(key, spdx_id, name)| {
            let mut license = License::new(key, name);
            if !spdx_id.is_empty() {
                license.alt_name = Some(spdx_id.to_string());
                license.link = Some(format!("https://spdx.org/licenses/{}.html", spdx_id));
            }
            license
        }))
    }
}

/// License keys are compared lowercase and trimmed (`"MIT "` → `"mit"`).
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}
