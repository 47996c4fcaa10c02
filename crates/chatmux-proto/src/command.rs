//! Command registry.
//!
//! A fixed table mapping RFC 2812 numerics and command names to a canonical
//! name and a classification. Numerics are canonicalised to their symbolic
//! names (`001` → `RPL_WELCOME`), so the rest of the client only ever deals
//! with names.
//!
//! # Reference
//! - RFC 2812 Section 3 (commands) and Section 5 (replies)
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use crate::error::MessageParseError;

/// Classification of a command token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandKind {
    /// A textual command such as `PRIVMSG`.
    Normal,
    /// A numeric reply (`RPL_*`).
    NumericResponse,
    /// A numeric error (`ERR_*`).
    NumericError,
    /// A numeric RFC 2812 reserves but does not define for clients.
    Reserved,
}

impl CommandKind {
    /// Returns true for the three numeric classes.
    pub fn is_numeric(self) -> bool {
        !matches!(self, CommandKind::Normal)
    }
}

/// One registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandInfo {
    /// Classification.
    pub kind: CommandKind,
    /// Three-digit code for numerics.
    pub numeric: Option<u16>,
    /// Canonical uppercase name.
    pub name: &'static str,
}

impl CommandInfo {
    /// The token written on the wire: the zero-padded code for numerics,
    /// the name otherwise.
    pub fn wire_token(&self) -> String {
        match self.numeric {
            Some(code) => format!("{:03}", code),
            None => self.name.to_string(),
        }
    }
}

impl fmt::Display for CommandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const fn normal(name: &'static str) -> CommandInfo {
    CommandInfo {
        kind: CommandKind::Normal,
        numeric: None,
        name,
    }
}

const fn reply(code: u16, name: &'static str) -> CommandInfo {
    CommandInfo {
        kind: CommandKind::NumericResponse,
        numeric: Some(code),
        name,
    }
}

const fn error(code: u16, name: &'static str) -> CommandInfo {
    CommandInfo {
        kind: CommandKind::NumericError,
        numeric: Some(code),
        name,
    }
}

const fn reserved(code: u16, name: &'static str) -> CommandInfo {
    CommandInfo {
        kind: CommandKind::Reserved,
        numeric: Some(code),
        name,
    }
}

/// Every command and numeric the registry knows about.
pub static COMMANDS: &[CommandInfo] = &[
    // === Connection Registration (001-099) ===
    reply(1, "RPL_WELCOME"),
    reply(2, "RPL_YOURHOST"),
    reply(3, "RPL_CREATED"),
    reply(4, "RPL_MYINFO"),
    reply(5, "RPL_ISUPPORT"),
    reply(10, "RPL_BOUNCE"),
    reply(42, "RPL_YOURID"),
    // === Command Responses (200-399) ===
    reply(200, "RPL_TRACELINK"),
    reply(201, "RPL_TRACECONNECTING"),
    reply(202, "RPL_TRACEHANDSHAKE"),
    reply(203, "RPL_TRACEUNKNOWN"),
    reply(204, "RPL_TRACEOPERATOR"),
    reply(205, "RPL_TRACEUSER"),
    reply(206, "RPL_TRACESERVER"),
    reply(207, "RPL_TRACESERVICE"),
    reply(208, "RPL_TRACENEWTYPE"),
    reply(209, "RPL_TRACECLASS"),
    reply(210, "RPL_TRACERECONNECT"),
    reply(211, "RPL_STATSLINKINFO"),
    reply(212, "RPL_STATSCOMMANDS"),
    reply(219, "RPL_ENDOFSTATS"),
    reply(221, "RPL_UMODEIS"),
    reply(234, "RPL_SERVLIST"),
    reply(235, "RPL_SERVLISTEND"),
    reply(242, "RPL_STATSUPTIME"),
    reply(243, "RPL_STATSOLINE"),
    reply(251, "RPL_LUSERCLIENT"),
    reply(252, "RPL_LUSEROP"),
    reply(253, "RPL_LUSERUNKNOWN"),
    reply(254, "RPL_LUSERCHANNELS"),
    reply(255, "RPL_LUSERME"),
    reply(256, "RPL_ADMINME"),
    reply(257, "RPL_ADMINLOC1"),
    reply(258, "RPL_ADMINLOC2"),
    reply(259, "RPL_ADMINEMAIL"),
    reply(261, "RPL_TRACELOG"),
    reply(262, "RPL_TRACEEND"),
    reply(263, "RPL_TRYAGAIN"),
    reply(265, "RPL_LOCALUSERS"),
    reply(266, "RPL_GLOBALUSERS"),
    reply(301, "RPL_AWAY"),
    reply(302, "RPL_USERHOST"),
    reply(303, "RPL_ISON"),
    reply(305, "RPL_UNAWAY"),
    reply(306, "RPL_NOWAWAY"),
    reply(311, "RPL_WHOISUSER"),
    reply(312, "RPL_WHOISSERVER"),
    reply(313, "RPL_WHOISOPERATOR"),
    reply(314, "RPL_WHOWASUSER"),
    reply(315, "RPL_ENDOFWHO"),
    reply(317, "RPL_WHOISIDLE"),
    reply(318, "RPL_ENDOFWHOIS"),
    reply(319, "RPL_WHOISCHANNELS"),
    reply(321, "RPL_LISTSTART"),
    reply(322, "RPL_LIST"),
    reply(323, "RPL_LISTEND"),
    reply(324, "RPL_CHANNELMODEIS"),
    reply(325, "RPL_UNIQOPIS"),
    reply(329, "RPL_CREATIONTIME"),
    reply(330, "RPL_WHOISACCOUNT"),
    reply(331, "RPL_NOTOPIC"),
    reply(332, "RPL_TOPIC"),
    reply(333, "RPL_TOPICWHOTIME"),
    reply(341, "RPL_INVITING"),
    reply(342, "RPL_SUMMONING"),
    reply(346, "RPL_INVITELIST"),
    reply(347, "RPL_ENDOFINVITELIST"),
    reply(348, "RPL_EXCEPTLIST"),
    reply(349, "RPL_ENDOFEXCEPTLIST"),
    reply(351, "RPL_VERSION"),
    reply(352, "RPL_WHOREPLY"),
    reply(353, "RPL_NAMREPLY"),
    reply(364, "RPL_LINKS"),
    reply(365, "RPL_ENDOFLINKS"),
    reply(366, "RPL_ENDOFNAMES"),
    reply(367, "RPL_BANLIST"),
    reply(368, "RPL_ENDOFBANLIST"),
    reply(369, "RPL_ENDOFWHOWAS"),
    reply(371, "RPL_INFO"),
    reply(372, "RPL_MOTD"),
    reply(374, "RPL_ENDOFINFO"),
    reply(375, "RPL_MOTDSTART"),
    reply(376, "RPL_ENDOFMOTD"),
    reply(378, "RPL_WHOISHOST"),
    reply(379, "RPL_WHOISMODES"),
    reply(381, "RPL_YOUREOPER"),
    reply(382, "RPL_REHASHING"),
    reply(383, "RPL_YOURESERVICE"),
    reply(391, "RPL_TIME"),
    reply(392, "RPL_USERSSTART"),
    reply(393, "RPL_USERS"),
    reply(394, "RPL_ENDOFUSERS"),
    reply(395, "RPL_NOUSERS"),
    reply(396, "RPL_HOSTHIDDEN"),
    reply(671, "RPL_WHOISSECURE"),
    // === Error Replies (400-599) ===
    error(400, "ERR_UNKNOWNERROR"),
    error(401, "ERR_NOSUCHNICK"),
    error(402, "ERR_NOSUCHSERVER"),
    error(403, "ERR_NOSUCHCHANNEL"),
    error(404, "ERR_CANNOTSENDTOCHAN"),
    error(405, "ERR_TOOMANYCHANNELS"),
    error(406, "ERR_WASNOSUCHNICK"),
    error(407, "ERR_TOOMANYTARGETS"),
    error(408, "ERR_NOSUCHSERVICE"),
    error(409, "ERR_NOORIGIN"),
    error(410, "ERR_INVALIDCAPCMD"),
    error(411, "ERR_NORECIPIENT"),
    error(412, "ERR_NOTEXTTOSEND"),
    error(413, "ERR_NOTOPLEVEL"),
    error(414, "ERR_WILDTOPLEVEL"),
    error(415, "ERR_BADMASK"),
    error(417, "ERR_INPUTTOOLONG"),
    error(421, "ERR_UNKNOWNCOMMAND"),
    error(422, "ERR_NOMOTD"),
    error(423, "ERR_NOADMININFO"),
    error(424, "ERR_FILEERROR"),
    error(431, "ERR_NONICKNAMEGIVEN"),
    error(432, "ERR_ERRONEUSNICKNAME"),
    error(433, "ERR_NICKNAMEINUSE"),
    error(436, "ERR_NICKCOLLISION"),
    error(437, "ERR_UNAVAILRESOURCE"),
    error(441, "ERR_USERNOTINCHANNEL"),
    error(442, "ERR_NOTONCHANNEL"),
    error(443, "ERR_USERONCHANNEL"),
    error(444, "ERR_NOLOGIN"),
    error(445, "ERR_SUMMONDISABLED"),
    error(446, "ERR_USERSDISABLED"),
    error(451, "ERR_NOTREGISTERED"),
    error(461, "ERR_NEEDMOREPARAMS"),
    error(462, "ERR_ALREADYREGISTRED"),
    error(463, "ERR_NOPERMFORHOST"),
    error(464, "ERR_PASSWDMISMATCH"),
    error(465, "ERR_YOUREBANNEDCREEP"),
    error(466, "ERR_YOUWILLBEBANNED"),
    error(467, "ERR_KEYSET"),
    error(471, "ERR_CHANNELISFULL"),
    error(472, "ERR_UNKNOWNMODE"),
    error(473, "ERR_INVITEONLYCHAN"),
    error(474, "ERR_BANNEDFROMCHAN"),
    error(475, "ERR_BADCHANNELKEY"),
    error(476, "ERR_BADCHANMASK"),
    error(477, "ERR_NOCHANMODES"),
    error(478, "ERR_BANLISTFULL"),
    error(481, "ERR_NOPRIVILEGES"),
    error(482, "ERR_CHANOPRIVSNEEDED"),
    error(483, "ERR_CANTKILLSERVER"),
    error(484, "ERR_RESTRICTED"),
    error(485, "ERR_UNIQOPPRIVSNEEDED"),
    error(491, "ERR_NOOPERHOST"),
    error(501, "ERR_UMODEUNKNOWNFLAG"),
    error(502, "ERR_USERSDONTMATCH"),
    // === Reserved (RFC 2812 Section 5.3) ===
    reserved(213, "RPL_STATSCLINE"),
    reserved(214, "RPL_STATSNLINE"),
    reserved(215, "RPL_STATSILINE"),
    reserved(216, "RPL_STATSKLINE"),
    reserved(217, "RPL_STATSQLINE"),
    reserved(218, "RPL_STATSYLINE"),
    reserved(231, "RPL_SERVICEINFO"),
    reserved(232, "RPL_ENDOFSERVICES"),
    reserved(233, "RPL_SERVICE"),
    reserved(240, "RPL_STATSVLINE"),
    reserved(241, "RPL_STATSLLINE"),
    reserved(244, "RPL_STATSHLINE"),
    reserved(246, "RPL_STATSPING"),
    reserved(247, "RPL_STATSBLINE"),
    reserved(250, "RPL_STATSDLINE"),
    reserved(300, "RPL_NONE"),
    reserved(316, "RPL_WHOISCHANOP"),
    reserved(361, "RPL_KILLDONE"),
    reserved(362, "RPL_CLOSING"),
    reserved(363, "RPL_CLOSEEND"),
    reserved(373, "RPL_INFOSTART"),
    reserved(384, "RPL_MYPORTIS"),
    reserved(492, "ERR_NOSERVICEHOST"),
    // === Commands ===
    normal("PASS"),
    normal("NICK"),
    normal("USER"),
    normal("OPER"),
    normal("MODE"),
    normal("SERVICE"),
    normal("QUIT"),
    normal("SQUIT"),
    normal("JOIN"),
    normal("PART"),
    normal("TOPIC"),
    normal("NAMES"),
    normal("LIST"),
    normal("INVITE"),
    normal("KICK"),
    normal("PRIVMSG"),
    normal("NOTICE"),
    normal("MOTD"),
    normal("LUSERS"),
    normal("VERSION"),
    normal("STATS"),
    normal("LINKS"),
    normal("TIME"),
    normal("CONNECT"),
    normal("TRACE"),
    normal("ADMIN"),
    normal("INFO"),
    normal("SERVLIST"),
    normal("SQUERY"),
    normal("WHO"),
    normal("WHOIS"),
    normal("WHOWAS"),
    normal("KILL"),
    normal("PING"),
    normal("PONG"),
    normal("ERROR"),
    normal("AWAY"),
    normal("REHASH"),
    normal("DIE"),
    normal("RESTART"),
    normal("SUMMON"),
    normal("USERS"),
    normal("WALLOPS"),
    normal("USERHOST"),
    normal("ISON"),
    normal("CAP"),
];

lazy_static! {
    static ref BY_NAME: HashMap<&'static str, &'static CommandInfo> =
        COMMANDS.iter().map(|info| (info.name, info)).collect();
    static ref BY_NUMERIC: HashMap<u16, &'static CommandInfo> = COMMANDS
        .iter()
        .filter_map(|info| info.numeric.map(|code| (code, info)))
        .collect();
}

/// Look up a registered name, case-insensitively.
pub fn by_name(name: &str) -> Option<&'static CommandInfo> {
    BY_NAME.get(name.to_ascii_uppercase().as_str()).copied()
}

/// Look up a numeric code.
pub fn by_numeric(code: u16) -> Option<&'static CommandInfo> {
    BY_NUMERIC.get(&code).copied()
}

/// Numeric code for a registered name, if it is a numeric.
pub fn numeric_for(name: &str) -> Option<u16> {
    by_name(name).and_then(|info| info.numeric)
}

/// Classify a command token as it appears on the wire.
///
/// Three-digit tokens are looked up as numerics, anything else as a name.
///
/// # Errors
///
/// [`MessageParseError::UnknownCommand`] if the token is not registered.
pub fn lookup(token: &str) -> Result<&'static CommandInfo, MessageParseError> {
    let found = if is_numeric_token(token) {
        token.parse::<u16>().ok().and_then(by_numeric)
    } else {
        by_name(token)
    };
    found.ok_or_else(|| MessageParseError::UnknownCommand(token.to_string()))
}

fn is_numeric_token(token: &str) -> bool {
    token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit())
}
