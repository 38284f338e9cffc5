//! Stand-in payloads returned under the `Placeholder` policy
//!
//! Shapes match the real responses so callers render them unchanged.

use chrono::Utc;

use crate::data::{
    ChannelGroup, ChannelInfo, Folder, HotListItem, ResourceRecord, ShareFile, ShareInfo,
    ShareInfoParams, Sponsor,
};

pub const MESSAGE: &str = "service unavailable, showing placeholder data";
pub const SAVE_MESSAGE: &str = "saved (placeholder mode)";

const PLACEHOLDER_CHANNEL: &str = "placeholder_channel";

pub fn search(keyword: &str) -> Vec<ChannelGroup> {
    vec![ChannelGroup {
        id: PLACEHOLDER_CHANNEL.to_string(),
        channel_info: ChannelInfo {
            name: "Placeholder channel".to_string(),
            channel_logo: String::new(),
            channel_id: PLACEHOLDER_CHANNEL.to_string(),
        },
        display_list: true,
        list: vec![ResourceRecord {
            id: "1".to_string(),
            title: format!("Placeholder resource - {}", keyword),
            cloud_links: vec!["https://pan.quark.cn/s/mock123".to_string()],
            cloud_type: "quark".to_string(),
            channel: "Placeholder channel".to_string(),
            pub_date: Utc::now().to_rfc3339(),
            is_support_save: true,
        }],
    }]
}

pub fn hot_list() -> Vec<HotListItem> {
    vec![HotListItem {
        id: "1".to_string(),
        title: "Placeholder hot movie".to_string(),
        rate: "8.5".to_string(),
        cover: String::new(),
        cover_x: 200,
        cover_y: 300,
        episodes_info: String::new(),
        is_new: false,
        playable: true,
        url: String::new(),
    }]
}

/// Echoes the share and receive codes back as `pwdId` / `stoken`
pub fn share_info(params: &ShareInfoParams) -> ShareInfo {
    ShareInfo {
        list: vec![ShareFile {
            file_id: "mock_file_1".to_string(),
            file_name: "Placeholder file".to_string(),
            file_size: "1GB".to_string(),
            file_id_token: "mock_token".to_string(),
        }],
        pwd_id: params.share_code.clone(),
        stoken: params.receive_code.clone().unwrap_or_default(),
    }
}

pub fn folders() -> Vec<Folder> {
    vec![Folder {
        cid: "1".to_string(),
        name: "Placeholder folder".to_string(),
        path: Vec::new(),
    }]
}

pub fn sponsors() -> Vec<Sponsor> {
    vec![Sponsor {
        name: "Placeholder sponsor".to_string(),
        amount: "100".to_string(),
        date: Utc::now().to_rfc3339(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_placeholder_mentions_keyword() {
        let groups = search("dune");
        assert_eq!(groups.len(), 1);
        assert!(groups[0].list[0].title.contains("dune"));
    }

    #[test]
    fn test_share_info_echoes_codes() {
        let info = share_info(&ShareInfoParams {
            share_code: "abc".into(),
            receive_code: None,
        });
        assert_eq!(info.pwd_id, "abc");
        assert_eq!(info.stoken, "");
    }
}
