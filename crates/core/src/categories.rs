//! API category classification.
//!
//! Every API lands in exactly one category, which names its output files
//! (`AIT.<Category>.cs`, `Plugins/AppsInToss-<Category>.jslib`). Lookup order:
//! the explicit table (plus configured extras), event APIs, the owning
//! namespace, the originating file name, and finally [`OTHER`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use sdkgen_common::{ParsedApi, to_pascal_case};

use crate::collector::identifier;

/// Catch-all category, always ordered last.
pub const OTHER: &str = "Other";

/// Default category of event subscription APIs.
pub const APP_EVENTS: &str = "AppEvents";

const EXPLICIT: &[(&str, &[&str])] = &[
    ("Authentication", &["appLogin", "getIsTossLoginIntegratedService"]),
    ("Payment", &["checkoutPayment"]),
    ("Location", &["getCurrentLocation", "startUpdateLocation"]),
    ("Permission", &["getPermission", "requestPermission", "openPermissionDialog"]),
    (
        "SystemInfo",
        &[
            "getNetworkStatus",
            "getPlatformOS",
            "getTossAppVersion",
            "getOperationalEnvironment",
            "getSchemeUri",
            "getLocale",
            "getDeviceId",
        ],
    ),
    (
        "GameCenter",
        &[
            "getGameCenterGameProfile",
            "openGameCenterLeaderboard",
            "submitGameCenterLeaderBoardScore",
            "getUserKeyForGame",
            "grantPromotionRewardForGame",
        ],
    ),
    ("Clipboard", &["getClipboardText", "setClipboardText"]),
    ("Share", &["share", "getTossShareLink", "contactsViral", "fetchContacts"]),
    ("Media", &["openCamera", "fetchAlbumPhotos", "saveBase64Data"]),
    (
        "Device",
        &[
            "generateHapticFeedback",
            "setDeviceOrientation",
            "setScreenAwakeMode",
            "setSecureScreen",
            "setIosSwipeGestureEnabled",
        ],
    ),
    ("Navigation", &["closeView", "openURL"]),
    ("Events", &["eventLog"]),
    ("Certificate", &["appsInTossSignTossCert"]),
    ("Visibility", &["onVisibilityChangedByTransparentServiceWeb"]),
    (
        "IAP",
        &[
            "IAPCreateOneTimePurchaseOrder",
            "IAPGetProductItemList",
            "IAPGetPendingOrders",
            "IAPGetCompletedOrRefundedOrders",
            "IAPCompleteProductGrant",
        ],
    ),
    ("Storage", &["StorageGetItem", "StorageSetItem", "StorageRemoveItem", "StorageClearItems"]),
    (
        "Advertising",
        &[
            "GoogleAdMobLoadAppsInTossAdMob",
            "GoogleAdMobShowAppsInTossAdMob",
            "GoogleAdMobLoadAdMobInterstitialAd",
            "GoogleAdMobShowAdMobInterstitialAd",
            "GoogleAdMobLoadAdMobRewardedAd",
            "GoogleAdMobShowAdMobRewardedAd",
            "TossAdsInitialize",
            "TossAdsAttach",
            "TossAdsDestroy",
            "TossAdsDestroyAll",
        ],
    ),
    ("SafeArea", &["SafeAreaInsetsGet", "SafeAreaInsetsSubscribe"]),
    ("Partner", &["partnerAddAccessoryButton", "partnerRemoveAccessoryButton"]),
    (
        "AppEvents",
        &[
            "TdsEventSubscribeNavigationAccessoryEvent",
            "GraniteEventSubscribeBackEvent",
            "AppsInTossEventSubscribeEntryMessageExited",
        ],
    ),
    ("Environment", &["envGetDeploymentId", "isMinVersionSupported", "getAppsInTossGlobals"]),
];

/// Display order of the well-known categories.
const ORDER: &[&str] = &[
    "Authentication",
    "Payment",
    "IAP",
    "SystemInfo",
    "Location",
    "Permission",
    "GameCenter",
    "Share",
    "Media",
    "Clipboard",
    "Device",
    "Navigation",
    "Events",
    "Certificate",
    "Visibility",
    "Storage",
    "Advertising",
    "SafeArea",
    "Partner",
    "AppEvents",
    "Environment",
];

/// Namespaces whose category is not their PascalCased name.
const NAMESPACE_OVERRIDES: &[(&str, &str)] = &[
    ("GoogleAdMob", "Advertising"),
    ("TossAds", "Advertising"),
    ("SafeAreaInsets", "SafeArea"),
    ("env", "Environment"),
    ("partner", "Partner"),
];

/// Category lookup for one run.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    explicit: HashMap<String, String>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl CategoryTable {
    /// The built-in table with `extra` (category -> API names) merged over it.
    pub fn new(extra: &BTreeMap<String, Vec<String>>) -> Self {
        let mut explicit = HashMap::new();
        for (category, names) in EXPLICIT {
            for name in *names {
                explicit.insert((*name).to_string(), (*category).to_string());
            }
        }
        for (category, names) in extra {
            for name in names {
                explicit.insert(name.clone(), category.clone());
            }
        }
        Self { explicit }
    }

    /// Category named for `key` (API name or PascalCase name) by the table.
    pub fn explicit(&self, key: &str) -> Option<&str> {
        self.explicit.get(key).map(String::as_str)
    }

    /// Assign a category to an API.
    pub fn classify(&self, api: &ParsedApi) -> String {
        if let Some(category) = self
            .explicit(&api.name)
            .or_else(|| self.explicit(&api.pascal_name))
        {
            return category.to_string();
        }
        if api.event.is_some() {
            return APP_EVENTS.to_string();
        }
        if let Some(namespace) = &api.namespace {
            return namespace_category(namespace);
        }
        file_category(api.file_name())
    }
}

fn namespace_category(namespace: &str) -> String {
    NAMESPACE_OVERRIDES
        .iter()
        .find(|(ns, _)| *ns == namespace)
        .map_or_else(|| to_pascal_case(&identifier(namespace)), |(_, c)| (*c).to_string())
}

/// `device-info.d.ts` -> `DeviceInfo`; barrels fall back to [`OTHER`].
fn file_category(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".d.ts").unwrap_or(file_name);
    if stem.is_empty() || stem == "index" {
        return OTHER.to_string();
    }
    let category = to_pascal_case(&identifier(stem));
    if category.is_empty() { OTHER.to_string() } else { category }
}

/// Compare two categories by display order.
pub fn compare(a: &str, b: &str) -> Ordering {
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

/// Sort categories: well-known order, then alphabetical, [`OTHER`] last.
pub fn sort(categories: &mut [String]) {
    categories.sort_by(|a, b| compare(a, b));
}

fn rank(category: &str) -> usize {
    if category == OTHER {
        return ORDER.len() + 1;
    }
    ORDER
        .iter()
        .position(|c| *c == category)
        .unwrap_or(ORDER.len())
}
