use std::sync::Arc;

use trainwatch_stomp::Subscription;

use crate::decoder::FeedDecoder;
use crate::ppm::PpmDecoder;
use crate::td::TdDecoder;
use crate::tm::TmDecoder;

/// Which of the three feed families a subscription belongs to: a mapping
/// from feed identifier to a decode function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Ppm,
    Td,
    Tm,
}

/// One feed's subscriptions plus the decoder that handles its payloads.
pub struct FeedDescriptor {
    pub kind: FeedKind,
    pub subscriptions: Vec<Subscription>,
    pub decoder: Arc<dyn FeedDecoder>,
}

/// Every feed this core knows how to subscribe to and decode, independent
/// of which ones a given deployment actually enables
/// (`COLLECTOR_PPM`/`_TD`/`_TM`). Topic and durable names mirror the
/// upstream openraildata STOMP feeds this system was built against.
#[must_use]
pub fn known_feeds() -> Vec<FeedDescriptor> {
    vec![
        FeedDescriptor {
            kind: FeedKind::Ppm,
            subscriptions: vec![Subscription {
                topic: "/topic/RTPPM_ALL".to_owned(),
                durable: "thetrains-ppm".to_owned(),
            }],
            decoder: Arc::new(PpmDecoder),
        },
        FeedDescriptor {
            kind: FeedKind::Td,
            subscriptions: vec![
                Subscription {
                    topic: "/topic/TD_LNW_C_SIG_AREA".to_owned(),
                    durable: "thetrains-td-lnw-c".to_owned(),
                },
                Subscription {
                    topic: "/topic/TD_LNW_WMC_SIG_AREA".to_owned(),
                    durable: "thetrains-td-lnw-wmc".to_owned(),
                },
                Subscription {
                    topic: "/topic/TD_LNW_LC_SIG_AREA".to_owned(),
                    durable: "thetrains-td-lnw-lc".to_owned(),
                },
                Subscription {
                    topic: "/topic/TD_WCS_SIG_AREA".to_owned(),
                    durable: "thetrains-td-wcs".to_owned(),
                },
            ],
            decoder: Arc::new(TdDecoder),
        },
        FeedDescriptor {
            kind: FeedKind::Tm,
            subscriptions: vec![Subscription {
                topic: "/topic/TRAIN_MVT_ED_TOC".to_owned(),
                durable: "thetrains-tm".to_owned(),
            }],
            decoder: Arc::new(TmDecoder),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_feed_has_at_least_one_subscription() {
        for feed in known_feeds() {
            assert!(!feed.subscriptions.is_empty());
        }
    }
}
