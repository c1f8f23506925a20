//! Pre-authored narrative scripts for mock sessions.
//!
//! A [`MockScript`] supplies every text string the local simulator emits:
//! per-agent findings, proposal wording, commander lines, and the canned
//! replies for summary/code/explanation requests. One variant is chosen
//! uniformly at random per mock run; variants change narrative only, never
//! timing or control flow.

use rand::Rng;

use crate::agent::{PipelineStage, Team};

/// Findings posted by one team's pipeline, scanner through weaponizer.
#[derive(Debug, Clone, Copy)]
pub struct TeamLines {
    pub scanner: &'static str,
    pub infrastructure: &'static str,
    pub data: &'static str,
    pub weaponizer: &'static str,
}

/// Wording of a team's proposal card.
#[derive(Debug, Clone, Copy)]
pub struct ProposalText {
    pub action: &'static str,
    pub description: &'static str,
}

/// Canned code artifact for a team.
#[derive(Debug, Clone, Copy)]
pub struct CodeText {
    pub title: &'static str,
    pub description: &'static str,
    pub code: &'static str,
}

/// One immutable narrative template.
#[derive(Debug, Clone, Copy)]
pub struct MockScript {
    pub name: &'static str,
    pub red_lines: TeamLines,
    pub blue_lines: TeamLines,
    pub red_proposal: ProposalText,
    pub blue_proposal: ProposalText,
    /// Red commander's line when the approved strike executes.
    pub red_execute: &'static str,
    /// Blue commander's line when the approved counter deploys.
    pub blue_execute: &'static str,
    /// Commander's line after a rejected proposal.
    pub rethink: &'static str,
    /// Defense description installed by the blue execute step.
    pub defense_description: &'static str,
    pub red_summary: &'static str,
    pub blue_summary: &'static str,
    pub red_code: CodeText,
    pub blue_code: CodeText,
    pub explanation: &'static str,
}

impl MockScript {
    /// Picks one variant uniformly at random for a mock run.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> &'static MockScript {
        &VARIANTS[rng.gen_range(0..VARIANTS.len())]
    }

    /// The finding posted by `team`'s agent at `stage`.
    ///
    /// Commanders speak through [`red_execute`](Self::red_execute) /
    /// [`blue_execute`](Self::blue_execute) instead of a finding.
    pub fn line(&self, team: Team, stage: PipelineStage) -> &'static str {
        let lines = match team {
            Team::Red => &self.red_lines,
            Team::Blue => &self.blue_lines,
        };
        match stage {
            PipelineStage::Scanner => lines.scanner,
            PipelineStage::Infrastructure => lines.infrastructure,
            PipelineStage::Data => lines.data,
            PipelineStage::Weaponizer => lines.weaponizer,
            PipelineStage::Commander => match team {
                Team::Red => self.red_execute,
                Team::Blue => self.blue_execute,
            },
        }
    }

    pub fn proposal(&self, team: Team) -> ProposalText {
        match team {
            Team::Red => self.red_proposal,
            Team::Blue => self.blue_proposal,
        }
    }

    pub fn summary(&self, team: Team) -> &'static str {
        match team {
            Team::Red => self.red_summary,
            Team::Blue => self.blue_summary,
        }
    }

    pub fn code(&self, team: Team) -> CodeText {
        match team {
            Team::Red => self.red_code,
            Team::Blue => self.blue_code,
        }
    }
}

/// The authored variants. Every field is nonempty; tests enforce it.
pub static VARIANTS: [MockScript; 3] = [
    MockScript {
        name: "legacy-edge",
        red_lines: TeamLines {
            scanner: "Sweep complete: legacy router at 192.168.0.1 answers on ports 23 and 80, firmware build 2014.",
            infrastructure: "Mapped the DMZ: single unpatched edge device fronts the application subnet, no failover pair.",
            data: "Traffic capture shows cleartext admin logins crossing the edge every 15 minutes.",
            weaponizer: "Packaged a SYN flood generator tuned to the router's 512-entry connection table.",
        },
        blue_lines: TeamLines {
            scanner: "Anomaly feed shows inbound SYN rate climbing 40x baseline against the edge router.",
            infrastructure: "Edge device CPU pegged at 97%; connection table exhaustion imminent.",
            data: "Flow logs isolate the flood to a /24 of spoofed sources rotating every 30 seconds.",
            weaponizer: "Drafted SYN-cookie enablement plus an upstream rate limiter for the spoofed ranges.",
        },
        red_proposal: ProposalText {
            action: "SYN Flood: Edge Router",
            description: "Exhaust the legacy router's connection table with spoofed SYN packets, dropping the site offline.",
        },
        blue_proposal: ProposalText {
            action: "Deploy SYN Cookies + Rate Limit",
            description: "Enable SYN cookies on the edge and rate-limit the rotating spoofed ranges upstream.",
        },
        red_execute: "Authorized: SYN Flood. Launching against the edge router.",
        blue_execute: "Deploying: SYN cookies active, upstream rate limiter live.",
        rethink: "Proposal rejected. Re-tasking the pipeline for an alternative vector.",
        defense_description: "SYN cookies + upstream rate limiting on the edge router",
        red_summary: "Red team located an unpatched legacy edge router and prepared a connection-table exhaustion flood against it.",
        blue_summary: "Blue team detected the flood ramp early and countered with SYN cookies and upstream rate limiting.",
        red_code: CodeText {
            title: "SYN Flood Generator",
            description: "Spoofed-source SYN generator pointed at the edge router.",
            code: "for src in spoof_pool(rotate=30s):\n    send(tcp(flags='S', src=src, dst='192.168.0.1', dport=80))",
        },
        blue_code: CodeText {
            title: "Edge Hardening Rules",
            description: "SYN cookie enablement and upstream rate limiter.",
            code: "sysctl -w net.ipv4.tcp_syncookies=1\ntc qdisc add dev eth0 ingress rate 10mbit burst 32k",
        },
        explanation: "A SYN flood abuses the TCP handshake: the attacker sends connection requests from forged addresses and never completes them, filling the server's half-open connection table. SYN cookies let the server answer without storing state, so the table cannot be exhausted.",
    },
    MockScript {
        name: "exposed-api",
        red_lines: TeamLines {
            scanner: "Recon: public API gateway leaks version headers; build matches CVE-2023-46604 advisory window.",
            infrastructure: "Gateway sits in front of an internal message broker reachable through the management path.",
            data: "Broker queues carry serialized session tokens with a 24-hour validity window.",
            weaponizer: "Built a deserialization payload that pivots from the gateway into the broker's management API.",
        },
        blue_lines: TeamLines {
            scanner: "IDS flags malformed serialized objects arriving at the gateway management endpoint.",
            infrastructure: "Broker management path should never face the gateway; segmentation gap confirmed.",
            data: "Token queue access logs show a single unrecognized consumer since the alert began.",
            weaponizer: "Prepared an emergency ACL cutting the gateway-to-broker management route and rotating queued tokens.",
        },
        red_proposal: ProposalText {
            action: "Deserialization Pivot: Message Broker",
            description: "Exploit the gateway's known deserialization flaw to reach the broker and drain session tokens.",
        },
        blue_proposal: ProposalText {
            action: "Segment Broker + Rotate Tokens",
            description: "Cut the gateway-to-broker management route with an emergency ACL and invalidate queued tokens.",
        },
        red_execute: "Authorized: Deserialization pivot. Payload en route to the broker.",
        blue_execute: "Deploying: broker segmented, token rotation in progress.",
        rethink: "Rejected by operator. Scrapping the pivot, pipeline restarting reconnaissance.",
        defense_description: "Emergency ACL isolating the broker plus full session-token rotation",
        red_summary: "Red team chained a known gateway deserialization flaw into broker access aiming at the session token queues.",
        blue_summary: "Blue team confirmed the segmentation gap, isolated the broker behind an emergency ACL, and rotated exposed tokens.",
        red_code: CodeText {
            title: "Gadget Chain Payload",
            description: "Serialized object triggering the gateway deserialization flaw.",
            code: "payload = gadget_chain('CommonsCollections6')\npost('/gateway/mgmt', body=serialize(payload))",
        },
        blue_code: CodeText {
            title: "Emergency Broker ACL",
            description: "Drop rule for the gateway-to-broker management route.",
            code: "iptables -I FORWARD -s gateway -d broker --dport 8161 -j DROP\nbroker-cli tokens rotate --all",
        },
        explanation: "Unsafe deserialization lets an attacker hand a service a crafted object graph that executes code while being decoded. Defenders contain it by removing the exposed path (segmentation) and invalidating anything the attacker could have read, such as session tokens.",
    },
    MockScript {
        name: "credential-spray",
        red_lines: TeamLines {
            scanner: "Enumerated the SSO portal: lockout threshold is 10 attempts per hour, usernames follow first.last.",
            infrastructure: "Harvested 400 employee names from public sources; portal has no source-IP throttling.",
            data: "Seasonal password patterns from prior breach dumps suggest 'Summer2025!' class candidates.",
            weaponizer: "Staged a low-and-slow spray: one candidate per account per hour across residential proxies.",
        },
        blue_lines: TeamLines {
            scanner: "Auth telemetry shows a uniform one-failure-per-account pattern across hundreds of users.",
            infrastructure: "Failures originate from residential IP space; classic distributed spray signature.",
            data: "Three accounts returned success responses before the pattern was flagged.",
            weaponizer: "Queued conditional-access policy: block legacy auth, require MFA re-enrollment for the three hits.",
        },
        red_proposal: ProposalText {
            action: "Credential Spray: SSO Portal",
            description: "Spray seasonal password candidates below lockout thresholds across the harvested account list.",
        },
        blue_proposal: ProposalText {
            action: "Conditional Access Lockdown",
            description: "Block legacy authentication, force MFA re-enrollment on compromised accounts, and throttle by ASN.",
        },
        red_execute: "Authorized: spray is live across the proxy fleet.",
        blue_execute: "Deploying: conditional access policy enforced, compromised accounts contained.",
        rethink: "Operator declined. Standing down the spray, pipeline re-planning.",
        defense_description: "Conditional access: legacy auth blocked, MFA re-enrollment enforced",
        red_summary: "Red team prepared a distributed low-and-slow credential spray against the SSO portal using harvested names.",
        blue_summary: "Blue team recognized the spray signature in auth telemetry and locked it out with conditional access policies.",
        red_code: CodeText {
            title: "Low-and-Slow Sprayer",
            description: "Distributed spray loop staying under lockout thresholds.",
            code: "for account in harvested:\n    proxy = next(residential_pool)\n    try_login(account, candidate, via=proxy)\n    sleep(jitter(3600))",
        },
        blue_code: CodeText {
            title: "Conditional Access Policy",
            description: "Policy blocking legacy auth and forcing MFA re-enrollment.",
            code: "policy:\n  block: legacy_auth\n  require: mfa\n  scope: all_users\n  remediate: [j.doe, a.chen, m.ruiz]",
        },
        explanation: "Credential spraying tries one common password against many accounts, staying under per-account lockout limits. It defeats lockout policies but leaves a distinctive telemetry shape: many accounts each failing once. Conditional access policies counter it by demanding a second factor regardless of password success.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_variant_is_fully_authored() {
        for script in &VARIANTS {
            for team in [Team::Red, Team::Blue] {
                for stage in PipelineStage::iter() {
                    assert!(
                        !script.line(team, stage).is_empty(),
                        "{}: empty line for {team} {stage}",
                        script.name
                    );
                }
                let proposal = script.proposal(team);
                assert!(!proposal.action.is_empty());
                assert!(!proposal.description.is_empty());
                assert!(!script.summary(team).is_empty());
                let code = script.code(team);
                assert!(!code.title.is_empty());
                assert!(!code.code.is_empty());
            }
            assert!(!script.rethink.is_empty());
            assert!(!script.defense_description.is_empty());
            assert!(!script.explanation.is_empty());
        }
    }

    #[test]
    fn test_choose_stays_in_bounds() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let script = MockScript::choose(&mut rng);
            assert!(VARIANTS.iter().any(|v| v.name == script.name));
        }
    }
}
