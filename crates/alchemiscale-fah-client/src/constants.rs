// FAH adaptive sampling API paths

/// Assignment server endpoints, relative to the AS API root
pub mod as_api_path {
    use std::net::Ipv4Addr;

    pub fn work_server(ws: Ipv4Addr) -> String {
        format!("/ws/{ws}")
    }

    pub fn project(ws: Ipv4Addr, project_id: u64) -> String {
        format!("/ws/{ws}/projects/{project_id}")
    }
}

/// Work server endpoints, relative to the WS API root
pub mod ws_api_path {
    pub const PROJECTS: &str = "/projects";

    pub fn project(project_id: u64) -> String {
        format!("/projects/{project_id}")
    }

    pub fn project_files(project_id: u64) -> String {
        format!("/projects/{project_id}/files")
    }

    pub fn project_file(project_id: u64, path: &str) -> String {
        format!("/projects/{project_id}/files/{}", encode_file_path(path))
    }

    pub fn run_file(project_id: u64, run_id: u64, path: &str) -> String {
        project_file(project_id, &format!("{}/{}", run_dir(run_id), path.trim_start_matches('/')))
    }

    pub fn project_jobs(project_id: u64) -> String {
        format!("/projects/{project_id}/jobs")
    }

    pub fn clone(project_id: u64, run_id: u64, clone_id: u64) -> String {
        format!("/projects/{project_id}/runs/{run_id}/clones/{clone_id}")
    }

    pub fn clone_files(project_id: u64, run_id: u64, clone_id: u64) -> String {
        format!("{}/files", clone(project_id, run_id, clone_id))
    }

    pub fn clone_file(project_id: u64, run_id: u64, clone_id: u64, path: &str) -> String {
        format!(
            "{}/{}",
            clone_files(project_id, run_id, clone_id),
            encode_file_path(path)
        )
    }

    pub fn gen_files(project_id: u64, run_id: u64, clone_id: u64, gen_id: u64) -> String {
        format!("{}/gens/{gen_id}/files", clone(project_id, run_id, clone_id))
    }

    pub fn gen_file(project_id: u64, run_id: u64, clone_id: u64, gen_id: u64, path: &str) -> String {
        format!(
            "{}/{}",
            gen_files(project_id, run_id, clone_id, gen_id),
            encode_file_path(path)
        )
    }

    /// Directory holding a run's input files inside the project tree
    pub fn run_dir(run_id: u64) -> String {
        format!("RUN{run_id}")
    }

    /// Percent-encode each `/`-separated segment of a server file path
    fn encode_file_path(path: &str) -> String {
        path.trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_as_paths() {
        let ws = Ipv4Addr::new(10, 0, 0, 7);
        assert_eq!(as_api_path::work_server(ws), "/ws/10.0.0.7");
        assert_eq!(as_api_path::project(ws, 90001), "/ws/10.0.0.7/projects/90001");
    }

    #[test]
    fn test_ws_paths() {
        assert_eq!(ws_api_path::project_file(1, "/a/b.txt"), "/projects/1/files/a/b.txt");
        assert_eq!(ws_api_path::run_file(1, 3, "core.xml"), "/projects/1/files/RUN3/core.xml");
        assert_eq!(
            ws_api_path::clone_file(1, 2, 3, "results.tar.bz2"),
            "/projects/1/runs/2/clones/3/files/results.tar.bz2"
        );
        assert_eq!(
            ws_api_path::gen_files(1, 2, 3, 4),
            "/projects/1/runs/2/clones/3/gens/4/files"
        );
    }

    #[test]
    fn test_file_paths_are_percent_encoded() {
        assert_eq!(
            ws_api_path::project_file(1, "frame#1.dat"),
            "/projects/1/files/frame%231.dat"
        );
        assert_eq!(
            ws_api_path::run_file(1, 0, "what?.dat"),
            "/projects/1/files/RUN0/what%3F.dat"
        );
        assert_eq!(
            ws_api_path::clone_file(1, 2, 3, "traj dir/positions.xtc"),
            "/projects/1/runs/2/clones/3/files/traj%20dir/positions.xtc"
        );
        assert_eq!(
            ws_api_path::gen_file(1, 2, 3, 4, "/100%.log"),
            "/projects/1/runs/2/clones/3/gens/4/files/100%25.log"
        );
    }
}
