//! Numeric reply names.
//!
//! Static mapping between three-digit numerics and their mnemonics, drawn
//! from RFC 1459, RFC 2812 and the replies common modern networks send.
//!
//! # Reference
//! - RFC 2812 Section 5: Replies
//! - <https://defs.ircdocs.horse/defs/numerics.html>

/// Numeric table, sorted by code.
static NUMERICS: &[(u16, &str)] = &[
    (1, "RPL_WELCOME"),
    (2, "RPL_YOURHOST"),
    (3, "RPL_CREATED"),
    (4, "RPL_MYINFO"),
    (5, "RPL_ISUPPORT"),
    (10, "RPL_BOUNCE"),
    (200, "RPL_TRACELINK"),
    (201, "RPL_TRACECONNECTING"),
    (202, "RPL_TRACEHANDSHAKE"),
    (203, "RPL_TRACEUNKNOWN"),
    (204, "RPL_TRACEOPERATOR"),
    (205, "RPL_TRACEUSER"),
    (206, "RPL_TRACESERVER"),
    (207, "RPL_TRACESERVICE"),
    (208, "RPL_TRACENEWTYPE"),
    (209, "RPL_TRACECLASS"),
    (211, "RPL_STATSLINKINFO"),
    (212, "RPL_STATSCOMMANDS"),
    (219, "RPL_ENDOFSTATS"),
    (221, "RPL_UMODEIS"),
    (234, "RPL_SERVLIST"),
    (235, "RPL_SERVLISTEND"),
    (242, "RPL_STATSUPTIME"),
    (243, "RPL_STATSOLINE"),
    (250, "RPL_STATSCONN"),
    (251, "RPL_LUSERCLIENT"),
    (252, "RPL_LUSEROP"),
    (253, "RPL_LUSERUNKNOWN"),
    (254, "RPL_LUSERCHANNELS"),
    (255, "RPL_LUSERME"),
    (256, "RPL_ADMINME"),
    (257, "RPL_ADMINLOC1"),
    (258, "RPL_ADMINLOC2"),
    (259, "RPL_ADMINEMAIL"),
    (261, "RPL_TRACELOG"),
    (262, "RPL_TRACEEND"),
    (263, "RPL_TRYAGAIN"),
    (265, "RPL_LOCALUSERS"),
    (266, "RPL_GLOBALUSERS"),
    (276, "RPL_WHOISCERTFP"),
    (301, "RPL_AWAY"),
    (302, "RPL_USERHOST"),
    (303, "RPL_ISON"),
    (305, "RPL_UNAWAY"),
    (306, "RPL_NOWAWAY"),
    (311, "RPL_WHOISUSER"),
    (312, "RPL_WHOISSERVER"),
    (313, "RPL_WHOISOPERATOR"),
    (314, "RPL_WHOWASUSER"),
    (315, "RPL_ENDOFWHO"),
    (317, "RPL_WHOISIDLE"),
    (318, "RPL_ENDOFWHOIS"),
    (319, "RPL_WHOISCHANNELS"),
    (321, "RPL_LISTSTART"),
    (322, "RPL_LIST"),
    (323, "RPL_LISTEND"),
    (324, "RPL_CHANNELMODEIS"),
    (329, "RPL_CREATIONTIME"),
    (330, "RPL_WHOISACCOUNT"),
    (331, "RPL_NOTOPIC"),
    (332, "RPL_TOPIC"),
    (333, "RPL_TOPICWHOTIME"),
    (341, "RPL_INVITING"),
    (346, "RPL_INVITELIST"),
    (347, "RPL_ENDOFINVITELIST"),
    (348, "RPL_EXCEPTLIST"),
    (349, "RPL_ENDOFEXCEPTLIST"),
    (351, "RPL_VERSION"),
    (352, "RPL_WHOREPLY"),
    (353, "RPL_NAMREPLY"),
    (354, "RPL_WHOSPCRPL"),
    (364, "RPL_LINKS"),
    (365, "RPL_ENDOFLINKS"),
    (366, "RPL_ENDOFNAMES"),
    (367, "RPL_BANLIST"),
    (368, "RPL_ENDOFBANLIST"),
    (369, "RPL_ENDOFWHOWAS"),
    (371, "RPL_INFO"),
    (372, "RPL_MOTD"),
    (374, "RPL_ENDOFINFO"),
    (375, "RPL_MOTDSTART"),
    (376, "RPL_ENDOFMOTD"),
    (378, "RPL_WHOISHOST"),
    (381, "RPL_YOUREOPER"),
    (382, "RPL_REHASHING"),
    (391, "RPL_TIME"),
    (396, "RPL_HOSTHIDDEN"),
    (401, "ERR_NOSUCHNICK"),
    (402, "ERR_NOSUCHSERVER"),
    (403, "ERR_NOSUCHCHANNEL"),
    (404, "ERR_CANNOTSENDTOCHAN"),
    (405, "ERR_TOOMANYCHANNELS"),
    (406, "ERR_WASNOSUCHNICK"),
    (407, "ERR_TOOMANYTARGETS"),
    (409, "ERR_NOORIGIN"),
    (411, "ERR_NORECIPIENT"),
    (412, "ERR_NOTEXTTOSEND"),
    (421, "ERR_UNKNOWNCOMMAND"),
    (422, "ERR_NOMOTD"),
    (431, "ERR_NONICKNAMEGIVEN"),
    (432, "ERR_ERRONEUSNICKNAME"),
    (433, "ERR_NICKNAMEINUSE"),
    (436, "ERR_NICKCOLLISION"),
    (437, "ERR_UNAVAILRESOURCE"),
    (441, "ERR_USERNOTINCHANNEL"),
    (442, "ERR_NOTONCHANNEL"),
    (443, "ERR_USERONCHANNEL"),
    (451, "ERR_NOTREGISTERED"),
    (461, "ERR_NEEDMOREPARAMS"),
    (462, "ERR_ALREADYREGISTRED"),
    (464, "ERR_PASSWDMISMATCH"),
    (465, "ERR_YOUREBANNEDCREEP"),
    (471, "ERR_CHANNELISFULL"),
    (472, "ERR_UNKNOWNMODE"),
    (473, "ERR_INVITEONLYCHAN"),
    (474, "ERR_BANNEDFROMCHAN"),
    (475, "ERR_BADCHANNELKEY"),
    (476, "ERR_BADCHANMASK"),
    (477, "ERR_NEEDREGGEDNICK"),
    (481, "ERR_NOPRIVILEGES"),
    (482, "ERR_CHANOPRIVSNEEDED"),
    (491, "ERR_NOOPERHOST"),
    (501, "ERR_UMODEUNKNOWNFLAG"),
    (502, "ERR_USERSDONTMATCH"),
    (670, "RPL_STARTTLS"),
    (671, "RPL_WHOISSECURE"),
    (691, "ERR_STARTTLS"),
    (900, "RPL_LOGGEDIN"),
    (901, "RPL_LOGGEDOUT"),
    (902, "ERR_NICKLOCKED"),
    (903, "RPL_SASLSUCCESS"),
    (904, "ERR_SASLFAIL"),
    (905, "ERR_SASLTOOLONG"),
    (906, "ERR_SASLABORTED"),
    (907, "ERR_SASLALREADY"),
    (908, "RPL_SASLMECHS"),
];

/// Mnemonic for a numeric code, e.g. `1` → `RPL_WELCOME`.
pub fn symbolic(code: u16) -> Option<&'static str> {
    NUMERICS
        .binary_search_by_key(&code, |&(c, _)| c)
        .ok()
        .map(|i| NUMERICS[i].1)
}

/// Numeric code for a mnemonic, e.g. `ERR_NICKNAMEINUSE` → `433`.
pub fn numeric(name: &str) -> Option<u16> {
    NUMERICS
        .iter()
        .find(|&&(_, n)| n == name)
        .map(|&(c, _)| c)
}

/// Parse a command token that is exactly three ASCII digits.
pub fn parse_code(command: &str) -> Option<u16> {
    if command.len() == 3 && command.bytes().all(|b| b.is_ascii_digit()) {
        command.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(NUMERICS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_lookup_both_ways() {
        assert_eq!(symbolic(1), Some("RPL_WELCOME"));
        assert_eq!(symbolic(433), Some("ERR_NICKNAMEINUSE"));
        assert_eq!(numeric("RPL_ENDOFMOTD"), Some(376));
        assert_eq!(symbolic(999), None);
        assert_eq!(numeric("PRIVMSG"), None);
    }

    #[test]
    fn test_parse_code_requires_three_digits() {
        assert_eq!(parse_code("001"), Some(1));
        assert_eq!(parse_code("433"), Some(433));
        assert_eq!(parse_code("01"), None);
        assert_eq!(parse_code("0001"), None);
        assert_eq!(parse_code("PING"), None);
    }
}
